//! Device profiles — viewport, user agent, and touch emulation per capture.

use serde::{Deserialize, Serialize};

/// `{ name, viewport {w,h}, userAgent, deviceScaleFactor, isMobile, hasTouch }`
/// per §3. Each URL is captured once per configured profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub name: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub user_agent: String,
    pub device_scale_factor: f64,
    pub is_mobile: bool,
    pub has_touch: bool,
}

impl DeviceProfile {
    #[must_use]
    pub fn desktop() -> Self {
        Self {
            name: "desktop".to_string(),
            viewport_width: 1440,
            viewport_height: 900,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36"
                .to_string(),
            device_scale_factor: 1.0,
            is_mobile: false,
            has_touch: false,
        }
    }

    #[must_use]
    pub fn mobile() -> Self {
        Self {
            name: "mobile".to_string(),
            viewport_width: 390,
            viewport_height: 844,
            user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) \
                AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1"
                .to_string(),
            device_scale_factor: 3.0,
            is_mobile: true,
            has_touch: true,
        }
    }

    /// Look up a built-in profile by name. Unknown names fall back to
    /// `desktop` semantics with the given name — callers that need strict
    /// profile validation should check [`builtin_profiles`] membership.
    #[must_use]
    pub fn by_name(name: &str) -> Self {
        match name {
            "mobile" => Self::mobile(),
            _ => {
                let mut p = Self::desktop();
                p.name = name.to_string();
                p
            }
        }
    }
}

/// The two profiles §3 requires to be defined by default.
#[must_use]
pub fn builtin_profiles() -> Vec<DeviceProfile> {
    vec![DeviceProfile::desktop(), DeviceProfile::mobile()]
}
