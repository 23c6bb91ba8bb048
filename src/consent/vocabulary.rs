//! Static vocabulary/selector tables driving the consent resolver. Kept as
//! data, not code, per §9's redesign note — the evaluated script is built
//! by interpolating these tables, never by hand-writing selector logic in
//! JS for each CMP.

/// Known consent-management-platform selectors, checked in order before
/// falling back to text matching.
pub const CMP_SELECTORS: &[&str] = &[
    "#onetrust-accept-btn-handler",
    "#onetrust-banner-sdk .accept-btn",
    "#CybotCookiebotDialogBodyLevelButtonLevelOptinAllowAll",
    "#CybotCookiebotDialogBodyButtonAccept",
    "[data-testid='uc-accept-all-button']",
    ".sp_choice_type_11",
    "#didomi-notice-agree-button",
    ".cm-btn-accept",
    ".cc-allow",
    ".cc-btn.cc-allow",
];

/// Generic accept-class / aria-label patterns tried after the named CMPs.
pub const GENERIC_SELECTOR_PATTERNS: &[&str] = &[
    "[aria-label='Accept all']",
    "[aria-label='Accept All']",
    "[aria-label='Accept cookies']",
    "button[class*='accept' i]",
    "button[id*='accept' i]",
    "a[class*='accept' i]",
];

/// Normalized multilingual accept-button text vocabulary for the
/// text-matching pass.
pub const ACCEPT_TEXT_VOCABULARY: &[&str] = &[
    "accept all",
    "accept all cookies",
    "accept cookies",
    "i accept",
    "agree",
    "i agree",
    "allow all",
    "allow cookies",
    "got it",
    "ok",
    "understood",
    "akzeptieren",
    "alle akzeptieren",
    "tout accepter",
    "j'accepte",
    "aceptar todo",
    "aceptar",
    "accetta tutto",
    "concordo",
    "ich stimme zu",
];

/// Known banner container roots, used for the container-scoped pass and as
/// the last-resort force-remove list.
pub const BANNER_CONTAINER_SELECTORS: &[&str] = &[
    "#onetrust-banner-sdk",
    "#onetrust-consent-sdk",
    "#CybotCookiebotDialog",
    "#usercentrics-root",
    "#sp_message_container",
    "#didomi-host",
    ".klaro",
    "#cm",
    "#cookie-law-info-bar",
    ".cc-window",
    "[class*='cookie-banner' i]",
    "[class*='cookie-consent' i]",
    "[id*='cookie-banner' i]",
];

/// Well-known localStorage/sessionStorage keys + cookie pairs written to
/// persist synthetic acceptance so the page does not re-prompt.
pub const SYNTHETIC_ACCEPTANCE_PAIRS: &[(&str, &str)] = &[
    ("OptanonAlertBoxClosed", "true"),
    ("CookieConsent", "true"),
    ("cookieconsent_status", "allow"),
    ("cookie_consent_user_accepted", "true"),
    ("euconsent", "accepted"),
    ("didomi_token", "accepted"),
];

/// Body classes stripped when clearing scroll locks after the banner is
/// handled.
pub const SCROLL_LOCK_BODY_CLASSES: &[&str] = &[
    "no-scroll",
    "overflow-hidden",
    "modal-open",
    "ReactModal__Body--open",
    "ot-sdk-show-settings",
];
