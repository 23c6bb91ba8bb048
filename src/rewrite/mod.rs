//! HTML rewriter & offline shim (§4.6), grounded on the
//! `page_extractor/link_rewriter.rs` `lol_html::HtmlRewriter` usage,
//! generalized from a single link-tracking pass to the full asset/link
//! attribute rewrite plus offline-shim injection.

mod shim;

pub use shim::build_offline_shim;

use lol_html::{element, HtmlRewriter, Settings};
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use url::Url;

use crate::asset_store::AssetIndex;
use crate::config::{Config, DeviceProfile};
use crate::page_key::{derive_page_key, is_document_like};
use crate::same_site::SameSiteClassifier;

/// Outcome of a rewrite pass, surfaced to the capture engine's `reasons[]`
/// bookkeeping: rewrite failures are non-fatal per §7.
#[derive(Debug, Default)]
pub struct RewriteOutcome {
    pub html: String,
    pub errors: Vec<String>,
}

/// Attributes scanned for asset/link rewriting, per §4.6: "iterating
/// `link,script,img,source,iframe,video,audio`".
const ASSET_SELECTORS: &[(&str, &str)] = &[
    ("link[href]", "href"),
    ("script[src]", "src"),
    ("img[src]", "src"),
    ("img[data-src]", "data-src"),
    ("source[src]", "src"),
    ("iframe[src]", "src"),
    ("video[src]", "src"),
    ("video[poster]", "poster"),
    ("audio[src]", "src"),
];

const SRCSET_SELECTORS: &[&str] = &["img[srcset]", "source[srcset]"];

fn rewrite_srcset(original: &str, base: &Url, assets: &AssetIndex) -> String {
    original
        .split(',')
        .map(|token| {
            let token = token.trim();
            let mut parts = token.splitn(2, char::is_whitespace);
            let url_part = parts.next().unwrap_or_default();
            let descriptor = parts.next();
            let resolved = base.join(url_part).ok();
            let rewritten = resolved
                .and_then(|u| assets.get(u.as_str()))
                .map(|record| record.inline_data_uri.clone().unwrap_or(record.rewrite_to))
                .unwrap_or_else(|| url_part.to_string());
            match descriptor {
                Some(d) => format!("{rewritten} {d}"),
                None => rewritten,
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Rewrite one captured page's serialized HTML: same-site document links
/// repoint into the mirror tree, asset attributes repoint into the asset
/// index, mobile viewport meta is injected when absent, and (if a product
/// was extracted) an `x-archived-sku` meta tag is prepended.
#[must_use]
pub fn rewrite_page(
    html: &str,
    page_url: &Url,
    config: &Config,
    classifier: &SameSiteClassifier,
    assets: &Arc<AssetIndex>,
    profile: &DeviceProfile,
    sku: Option<&str>,
) -> RewriteOutcome {
    let mut errors = Vec::new();
    let base = page_url.clone();
    let include_query = config.rewrite.include_page_query_in_path;
    let rewrite_internal = config.rewrite.rewrite_internal;
    let rewrite_assets = config.rewrite.rewrite_html_assets;

    let mut output = Vec::new();
    let mut handlers = Vec::new();

    if rewrite_internal {
        let base_for_links = base.clone();
        let classifier_for_links = classifier.clone();
        handlers.push(element!("a[href]", move |el| {
            let Some(href) = el.get_attribute("href") else { return Ok(()) };
            if href.starts_with('#') || href.starts_with("mailto:") || href.starts_with("javascript:") {
                return Ok(());
            }
            let Ok(absolute) = base_for_links.join(&href) else { return Ok(()) };
            if !classifier_for_links.is_same_site(absolute.as_str()) {
                return Ok(());
            }
            let fragment = absolute.fragment().map(|f| format!("#{f}")).unwrap_or_default();
            let rewritten = if is_document_like(&absolute) {
                let page_key = derive_page_key(&absolute, include_query);
                format!("/{page_key}/{fragment}")
            } else {
                absolute.path().to_string()
            };
            let _ = el.set_attribute("href", &rewritten);
            Ok(())
        }));
    }

    for (selector, attr) in ASSET_SELECTORS {
        if !rewrite_assets {
            continue;
        }
        let assets_for_handler = assets.clone();
        let base_for_handler = base.clone();
        let attr_name = (*attr).to_string();
        handlers.push(element!(*selector, move |el| {
            let Some(value) = el.get_attribute(&attr_name) else { return Ok(()) };
            if value.starts_with("data:") {
                return Ok(());
            }
            if let Ok(absolute) = base_for_handler.join(&value)
                && let Some(record) = assets_for_handler.get(absolute.as_str())
            {
                let target = record.inline_data_uri.unwrap_or(record.rewrite_to);
                let _ = el.set_attribute(&attr_name, &target);
            }
            Ok(())
        }));
    }

    if rewrite_assets {
        for selector in SRCSET_SELECTORS {
            let assets_for_handler = assets.clone();
            let base_for_handler = base.clone();
            handlers.push(element!(*selector, move |el| {
                let Some(value) = el.get_attribute("srcset") else { return Ok(()) };
                let rewritten = rewrite_srcset(&value, &base_for_handler, &assets_for_handler);
                let _ = el.set_attribute("srcset", &rewritten);
                Ok(())
            }));
        }
    }

    // Mobile meta (§4.4): only injected when the page has not already
    // declared a viewport meta tag. `meta[name=viewport]` is necessarily
    // seen (if present) before `head`'s end tag, since it can only appear
    // as a child of `head`.
    let viewport_meta_present = Rc::new(Cell::new(false));
    if profile.is_mobile {
        let viewport_meta_present_for_detect = viewport_meta_present.clone();
        handlers.push(element!("meta[name=viewport]", move |_el| {
            viewport_meta_present_for_detect.set(true);
            Ok(())
        }));

        let viewport_meta_present = viewport_meta_present.clone();
        handlers.push(element!("head", move |el| {
            let viewport_meta_present = viewport_meta_present.clone();
            let end_tag_handler: Box<dyn FnOnce(&mut lol_html::html_content::EndTag<'_>) -> lol_html::HandlerResult> =
                Box::new(move |end| {
                    if !viewport_meta_present.get() {
                        end.before(
                            r#"<meta name="viewport" content="width=device-width, initial-scale=1">"#,
                            lol_html::html_content::ContentType::Html,
                        );
                    }
                    Ok(())
                });
            el.on_end_tag(end_tag_handler)?;
            Ok(())
        }));
    }

    if let Some(sku) = sku {
        let meta_tag = format!(r#"<meta name="x-archived-sku" content="{sku}">"#);
        handlers.push(element!("head", move |el| {
            el.prepend(&meta_tag, lol_html::html_content::ContentType::Html);
            Ok(())
        }));
    }

    let mut rewriter = HtmlRewriter::new(
        Settings { element_content_handlers: handlers, ..Settings::default() },
        |c: &[u8]| output.extend_from_slice(c),
    );

    if let Err(e) = rewriter.write(html.as_bytes()) {
        errors.push(format!("rewriteErr:{e}"));
    }
    if let Err(e) = rewriter.end() {
        errors.push(format!("rewriteErr:{e}"));
    }

    let rewritten = String::from_utf8(output).unwrap_or_else(|_| html.to_string());

    RewriteOutcome { html: rewritten, errors }
}
