//! Default user-facing failure messages.
//!
//! Used only when the backend did not explain a failure itself.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "zh-CN")]
    ZhCn,
    #[serde(rename = "en-US")]
    EnUs,
}

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::ZhCn => "zh-CN",
            Locale::EnUs => "en-US",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let lower = value.trim().to_ascii_lowercase().replace('_', "-");
        if lower == "zh" || lower.starts_with("zh-") {
            Ok(Locale::ZhCn)
        } else if lower == "en" || lower.starts_with("en-") {
            Ok(Locale::EnUs)
        } else {
            Err(format!("unsupported locale: {}", value))
        }
    }
}

/// Fallback messages for each store operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Messages {
    pub login_failed: &'static str,
    pub register_failed: &'static str,
    pub save_failed: &'static str,
    pub settings_load_failed: &'static str,
    pub wake_failed: &'static str,
    pub sleep_failed: &'static str,
    pub activity_failed: &'static str,
    pub pomodoro_failed: &'static str,
}

const ZH_CN: Messages = Messages {
    login_failed: "登录失败",
    register_failed: "注册失败",
    save_failed: "保存失败",
    settings_load_failed: "加载设置失败",
    wake_failed: "记录起床失败",
    sleep_failed: "记录睡觉失败",
    activity_failed: "更新活动失败",
    pomodoro_failed: "番茄钟操作失败",
};

const EN_US: Messages = Messages {
    login_failed: "Login failed",
    register_failed: "Registration failed",
    save_failed: "Save failed",
    settings_load_failed: "Failed to load settings",
    wake_failed: "Failed to record wake",
    sleep_failed: "Failed to record sleep",
    activity_failed: "Failed to update activity",
    pomodoro_failed: "Pomodoro request failed",
};

impl Messages {
    pub fn for_locale(locale: Locale) -> &'static Messages {
        match locale {
            Locale::ZhCn => &ZH_CN,
            Locale::EnUs => &EN_US,
        }
    }
}
