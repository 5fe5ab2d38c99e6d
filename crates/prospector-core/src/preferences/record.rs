use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

#[cfg(feature = "ts")]
use ts_rs::TS;

use super::PreferencesError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        })
    }
}

impl FromStr for Theme {
    type Err = PreferencesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "system" => Ok(Theme::System),
            _ => Err(PreferencesError::InvalidValue {
                key: "theme".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// The full preferences record.
///
/// Every field has a default. Deserializing merges the body over those
/// defaults field by field: a missing key or a `null` keeps the default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct PreferencesRecord {
    // Notifications
    pub email_notifications: bool,
    pub push_notifications: bool,
    pub campaign_updates: bool,
    pub weekly_reports: bool,
    pub error_alerts: bool,

    // Appearance
    pub theme: Theme,
    pub compact_mode: bool,
    pub animations_enabled: bool,
    /// Raw user input; rendering clamps it.
    pub font_size: u16,

    // Data & privacy
    pub data_retention_days: u32,
    pub share_analytics: bool,
    pub auto_export: bool,

    // System & performance
    pub auto_refresh: bool,
    pub refresh_interval_secs: u32,
    pub cache_enabled: bool,
    pub batch_size: u32,
}

impl Default for PreferencesRecord {
    fn default() -> Self {
        Self {
            email_notifications: true,
            push_notifications: false,
            campaign_updates: true,
            weekly_reports: true,
            error_alerts: true,

            theme: Theme::System,
            compact_mode: false,
            animations_enabled: true,
            font_size: 14,

            data_retention_days: 90,
            share_analytics: false,
            auto_export: false,

            auto_refresh: true,
            refresh_interval_secs: 30,
            cache_enabled: true,
            batch_size: 50,
        }
    }
}

/// Wire form of a stored record. Nullable columns come back as `null`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct StoredPreferences {
    email_notifications: Option<bool>,
    push_notifications: Option<bool>,
    campaign_updates: Option<bool>,
    weekly_reports: Option<bool>,
    error_alerts: Option<bool>,
    theme: Option<Theme>,
    compact_mode: Option<bool>,
    animations_enabled: Option<bool>,
    font_size: Option<u16>,
    data_retention_days: Option<u32>,
    share_analytics: Option<bool>,
    auto_export: Option<bool>,
    auto_refresh: Option<bool>,
    refresh_interval_secs: Option<u32>,
    cache_enabled: Option<bool>,
    batch_size: Option<u32>,
}

impl StoredPreferences {
    fn merge_over(self, base: PreferencesRecord) -> PreferencesRecord {
        PreferencesRecord {
            email_notifications: self.email_notifications.unwrap_or(base.email_notifications),
            push_notifications: self.push_notifications.unwrap_or(base.push_notifications),
            campaign_updates: self.campaign_updates.unwrap_or(base.campaign_updates),
            weekly_reports: self.weekly_reports.unwrap_or(base.weekly_reports),
            error_alerts: self.error_alerts.unwrap_or(base.error_alerts),
            theme: self.theme.unwrap_or(base.theme),
            compact_mode: self.compact_mode.unwrap_or(base.compact_mode),
            animations_enabled: self.animations_enabled.unwrap_or(base.animations_enabled),
            font_size: self.font_size.unwrap_or(base.font_size),
            data_retention_days: self.data_retention_days.unwrap_or(base.data_retention_days),
            share_analytics: self.share_analytics.unwrap_or(base.share_analytics),
            auto_export: self.auto_export.unwrap_or(base.auto_export),
            auto_refresh: self.auto_refresh.unwrap_or(base.auto_refresh),
            refresh_interval_secs: self.refresh_interval_secs.unwrap_or(base.refresh_interval_secs),
            cache_enabled: self.cache_enabled.unwrap_or(base.cache_enabled),
            batch_size: self.batch_size.unwrap_or(base.batch_size),
        }
    }
}

impl<'de> Deserialize<'de> for PreferencesRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        StoredPreferences::deserialize(deserializer)
            .map(|stored| stored.merge_over(PreferencesRecord::default()))
    }
}

impl PreferencesRecord {
    /// Apply a single typed edit.
    pub fn apply(&mut self, change: Preference) {
        match change {
            Preference::EmailNotifications(v) => self.email_notifications = v,
            Preference::PushNotifications(v) => self.push_notifications = v,
            Preference::CampaignUpdates(v) => self.campaign_updates = v,
            Preference::WeeklyReports(v) => self.weekly_reports = v,
            Preference::ErrorAlerts(v) => self.error_alerts = v,
            Preference::Theme(v) => self.theme = v,
            Preference::CompactMode(v) => self.compact_mode = v,
            Preference::AnimationsEnabled(v) => self.animations_enabled = v,
            Preference::FontSize(v) => self.font_size = v,
            Preference::DataRetentionDays(v) => self.data_retention_days = v,
            Preference::ShareAnalytics(v) => self.share_analytics = v,
            Preference::AutoExport(v) => self.auto_export = v,
            Preference::AutoRefresh(v) => self.auto_refresh = v,
            Preference::RefreshIntervalSecs(v) => self.refresh_interval_secs = v,
            Preference::CacheEnabled(v) => self.cache_enabled = v,
            Preference::BatchSize(v) => self.batch_size = v,
        }
    }
}

/// One typed field edit on a `PreferencesRecord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preference {
    EmailNotifications(bool),
    PushNotifications(bool),
    CampaignUpdates(bool),
    WeeklyReports(bool),
    ErrorAlerts(bool),
    Theme(Theme),
    CompactMode(bool),
    AnimationsEnabled(bool),
    FontSize(u16),
    DataRetentionDays(u32),
    ShareAnalytics(bool),
    AutoExport(bool),
    AutoRefresh(bool),
    RefreshIntervalSecs(u32),
    CacheEnabled(bool),
    BatchSize(u32),
}

impl Preference {
    /// Wire name of the field this edit touches.
    pub fn key(&self) -> &'static str {
        match self {
            Preference::EmailNotifications(_) => "emailNotifications",
            Preference::PushNotifications(_) => "pushNotifications",
            Preference::CampaignUpdates(_) => "campaignUpdates",
            Preference::WeeklyReports(_) => "weeklyReports",
            Preference::ErrorAlerts(_) => "errorAlerts",
            Preference::Theme(_) => "theme",
            Preference::CompactMode(_) => "compactMode",
            Preference::AnimationsEnabled(_) => "animationsEnabled",
            Preference::FontSize(_) => "fontSize",
            Preference::DataRetentionDays(_) => "dataRetentionDays",
            Preference::ShareAnalytics(_) => "shareAnalytics",
            Preference::AutoExport(_) => "autoExport",
            Preference::AutoRefresh(_) => "autoRefresh",
            Preference::RefreshIntervalSecs(_) => "refreshIntervalSecs",
            Preference::CacheEnabled(_) => "cacheEnabled",
            Preference::BatchSize(_) => "batchSize",
        }
    }

    /// Whether this edit changes what the document looks like.
    pub fn is_visual(&self) -> bool {
        matches!(
            self,
            Preference::Theme(_)
                | Preference::CompactMode(_)
                | Preference::AnimationsEnabled(_)
                | Preference::FontSize(_)
        )
    }

    /// Build an edit from a wire key and a textual value, e.g. from a form
    /// field or the command line.
    pub fn parse(key: &str, value: &str) -> Result<Self, PreferencesError> {
        let change = match key {
            "emailNotifications" => Preference::EmailNotifications(parse_value(key, value)?),
            "pushNotifications" => Preference::PushNotifications(parse_value(key, value)?),
            "campaignUpdates" => Preference::CampaignUpdates(parse_value(key, value)?),
            "weeklyReports" => Preference::WeeklyReports(parse_value(key, value)?),
            "errorAlerts" => Preference::ErrorAlerts(parse_value(key, value)?),
            "theme" => Preference::Theme(value.parse()?),
            "compactMode" => Preference::CompactMode(parse_value(key, value)?),
            "animationsEnabled" => Preference::AnimationsEnabled(parse_value(key, value)?),
            "fontSize" => Preference::FontSize(parse_value(key, value)?),
            "dataRetentionDays" => Preference::DataRetentionDays(parse_value(key, value)?),
            "shareAnalytics" => Preference::ShareAnalytics(parse_value(key, value)?),
            "autoExport" => Preference::AutoExport(parse_value(key, value)?),
            "autoRefresh" => Preference::AutoRefresh(parse_value(key, value)?),
            "refreshIntervalSecs" => Preference::RefreshIntervalSecs(parse_value(key, value)?),
            "cacheEnabled" => Preference::CacheEnabled(parse_value(key, value)?),
            "batchSize" => Preference::BatchSize(parse_value(key, value)?),
            _ => return Err(PreferencesError::UnknownKey(key.to_string())),
        };
        Ok(change)
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, PreferencesError> {
    value
        .trim()
        .parse()
        .map_err(|_| PreferencesError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        })
}
