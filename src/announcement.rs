use chrono::DateTime;
use reqwest::Url;

use crate::catalog::DeviceRecord;
use crate::config::AnnouncementConfig;
use crate::markdown::escape;

/// A single inline URL button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub url: String,
}

/// Caption plus keyboard, ready for the broadcast channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    /// MarkdownV2 caption, every interpolated value already escaped.
    pub caption: String,
    pub rows: Vec<Vec<Button>>,
}

type UrlRule = fn(&DeviceRecord, &AnnouncementConfig) -> Option<String>;

/// Which button goes where, and when. A rule yielding `None` drops its
/// button; a row left without buttons is dropped entirely.
struct ButtonRule {
    row: usize,
    label: &'static str,
    url: UrlRule,
}

const ROW_COUNT: usize = 3;

const BUTTON_RULES: [ButtonRule; 5] = [
    ButtonRule {
        row: 0,
        label: "📱 Official Website",
        url: site_url,
    },
    ButtonRule {
        row: 0,
        label: "⬇️ Download Page",
        url: download_url,
    },
    ButtonRule {
        row: 1,
        label: "💬 Support Group",
        url: support_group_url,
    },
    ButtonRule {
        row: 1,
        label: "📝 Changelog",
        url: changelog_url,
    },
    ButtonRule {
        row: 2,
        label: "☕️ Support Maintainer",
        url: maintainer_support_url,
    },
];

fn site_url(_: &DeviceRecord, config: &AnnouncementConfig) -> Option<String> {
    Some(config.site_url.clone())
}

// URLs carry the raw codename, never the escaped one
fn download_url(record: &DeviceRecord, config: &AnnouncementConfig) -> Option<String> {
    match Url::parse_with_params(&config.download_url, &[("codename", &record.codename)]) {
        Ok(url) => Some(url.into()),
        // Left unparsed so dispatch reports the bad base URL
        Err(_) => Some(format!("{}?codename={}", config.download_url, record.codename)),
    }
}

fn support_group_url(record: &DeviceRecord, config: &AnnouncementConfig) -> Option<String> {
    match &record.telegram_url {
        Some(url) => Some(url.clone()),
        None if config.support_group_prefix.is_empty() => None,
        None => Some(format!("{}{}", config.support_group_prefix, record.codename)),
    }
}

fn changelog_url(record: &DeviceRecord, _: &AnnouncementConfig) -> Option<String> {
    record.changelog_url.clone()
}

fn maintainer_support_url(record: &DeviceRecord, _: &AnnouncementConfig) -> Option<String> {
    record.support_url.clone()
}

/// Render a unix timestamp as e.g. `14 November 2023` (UTC).
pub fn format_build_date(timestamp: i64) -> String {
    match DateTime::from_timestamp(timestamp, 0) {
        Some(date) => date.format("%d %B %Y").to_string(),
        None => timestamp.to_string(),
    }
}

fn caption(record: &DeviceRecord, config: &AnnouncementConfig) -> String {
    let project = escape(&config.project_name);
    let project_tag = escape(&config.project_tag);
    let release_tag = escape(&config.release_tag);

    let device = escape(&record.device);
    let oem = escape(&record.oem);
    let maintainer = escape(&record.maintainer);
    let version = escape(&record.version);
    let build_type = escape(&record.build_type);
    let codename = escape(&record.codename);
    let build_date = escape(&format_build_date(record.timestamp));

    format!(
        "🚀 *New {project} Update Available\\!*\n\n\
         📱 *Device:* {oem} {device} \\({codename}\\)\n\
         👨‍💻 *Maintainer:* {maintainer}\n\
         📦 *Version:* {version}\n\
         🔧 *Build Type:* {build_type}\n\
         📅 *Build Date:* {build_date}\n\n\
         \\#{project_tag} \\#{codename} \\#{version} \\#{release_tag}"
    )
}

fn buttons(record: &DeviceRecord, config: &AnnouncementConfig) -> Vec<Vec<Button>> {
    let mut rows: Vec<Vec<Button>> = vec![Vec::new(); ROW_COUNT];
    for rule in &BUTTON_RULES {
        if let Some(url) = (rule.url)(record, config) {
            rows[rule.row].push(Button {
                label: rule.label.to_string(),
                url,
            });
        }
    }
    rows.retain(|row| !row.is_empty());
    rows
}

pub fn compose(record: &DeviceRecord, config: &AnnouncementConfig) -> Announcement {
    Announcement {
        caption: caption(record, config),
        rows: buttons(record, config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::unescape;

    fn panther() -> DeviceRecord {
        DeviceRecord {
            codename: "panther".to_string(),
            device: "Pixel X".to_string(),
            oem: "Google".to_string(),
            maintainer: "alice".to_string(),
            version: "3.2".to_string(),
            build_type: "OFFICIAL".to_string(),
            timestamp: 1_700_000_000,
            telegram_url: None,
            changelog_url: None,
            support_url: None,
        }
    }

    fn no_fallback() -> AnnouncementConfig {
        AnnouncementConfig {
            support_group_prefix: String::new(),
            ..AnnouncementConfig::default()
        }
    }

    fn labels(rows: &[Vec<Button>]) -> Vec<Vec<&str>> {
        rows.iter()
            .map(|row| row.iter().map(|b| b.label.as_str()).collect())
            .collect()
    }

    #[test]
    fn test_format_build_date() {
        assert_eq!(format_build_date(1_700_000_000), "14 November 2023");
        assert_eq!(format_build_date(0), "01 January 1970");
    }

    #[test]
    fn test_caption_exact_layout() {
        let announcement = compose(&panther(), &AnnouncementConfig::default());
        let expected = "🚀 *New RisingOS\\-Revived Update Available\\!*\n\n\
                        📱 *Device:* Google Pixel X \\(panther\\)\n\
                        👨‍💻 *Maintainer:* alice\n\
                        📦 *Version:* 3\\.2\n\
                        🔧 *Build Type:* OFFICIAL\n\
                        📅 *Build Date:* 14 November 2023\n\n\
                        \\#ROR \\#panther \\#3\\.2 \\#fifteen";
        assert_eq!(announcement.caption, expected);
    }

    #[test]
    fn test_caption_escapes_each_field() {
        let record = DeviceRecord {
            device: "Pixel 7a (EU)".to_string(),
            maintainer: "bob_the-builder".to_string(),
            build_type: "COMMUNITY+".to_string(),
            ..panther()
        };
        let caption = compose(&record, &AnnouncementConfig::default()).caption;
        assert!(caption.contains("Pixel 7a \\(EU\\)"));
        assert!(caption.contains("bob\\_the\\-builder"));
        assert!(caption.contains("COMMUNITY\\+"));
        assert!(!caption.contains("bob_the"));
    }

    #[test]
    fn test_caption_unescapes_to_plain_text() {
        let caption = compose(&panther(), &AnnouncementConfig::default()).caption;
        let plain = unescape(&caption);
        assert!(plain.contains("New RisingOS-Revived Update Available!"));
        assert!(plain.contains("Google Pixel X (panther)"));
        assert!(plain.ends_with("#ROR #panther #3.2 #fifteen"));
    }

    #[test]
    fn test_minimal_record_without_fallback_has_one_row() {
        let announcement = compose(&panther(), &no_fallback());
        assert_eq!(announcement.rows.len(), 1);
        assert_eq!(
            announcement.rows[0],
            vec![
                Button {
                    label: "📱 Official Website".to_string(),
                    url: "https://risingosrevived.tech/".to_string(),
                },
                Button {
                    label: "⬇️ Download Page".to_string(),
                    url: "https://risingosrevived.tech/downloads.html?codename=panther"
                        .to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_support_group_falls_back_to_prefix() {
        let announcement = compose(&panther(), &AnnouncementConfig::default());
        assert_eq!(
            labels(&announcement.rows),
            vec![
                vec!["📱 Official Website", "⬇️ Download Page"],
                vec!["💬 Support Group"],
            ]
        );
        assert_eq!(announcement.rows[1][0].url, "https://t.me/RisingOSpanther");
    }

    #[test]
    fn test_all_links_present() {
        let record = DeviceRecord {
            telegram_url: Some("https://t.me/panther_chat".to_string()),
            changelog_url: Some("https://example.com/panther.md".to_string()),
            support_url: Some("https://paypal.me/alice".to_string()),
            ..panther()
        };
        let announcement = compose(&record, &AnnouncementConfig::default());
        assert_eq!(
            labels(&announcement.rows),
            vec![
                vec!["📱 Official Website", "⬇️ Download Page"],
                vec!["💬 Support Group", "📝 Changelog"],
                vec!["☕️ Support Maintainer"],
            ]
        );
        assert_eq!(announcement.rows[1][0].url, "https://t.me/panther_chat");
        assert_eq!(announcement.rows[1][1].url, "https://example.com/panther.md");
        assert_eq!(announcement.rows[2][0].url, "https://paypal.me/alice");
    }

    #[test]
    fn test_row_rules_for_every_combination() {
        let link = |present: bool, url: &str| present.then(|| url.to_string());
        for mask in 0..8u8 {
            let (telegram, changelog, support) = (mask & 1 != 0, mask & 2 != 0, mask & 4 != 0);
            let record = DeviceRecord {
                telegram_url: link(telegram, "https://t.me/x"),
                changelog_url: link(changelog, "https://example.com/c"),
                support_url: link(support, "https://paypal.me/x"),
                ..panther()
            };

            for config in [AnnouncementConfig::default(), no_fallback()] {
                let fallback = !config.support_group_prefix.is_empty();
                let announcement = compose(&record, &config);
                let rows = labels(&announcement.rows);

                assert_eq!(rows[0].len(), 2, "mask {mask}");

                let support_button = telegram || fallback;
                let has_row_two = support_button || changelog;
                let expected_len = 1 + has_row_two as usize + support as usize;
                assert_eq!(rows.len(), expected_len, "mask {mask}");

                if has_row_two {
                    assert_eq!(rows[1].contains(&"📝 Changelog"), changelog, "mask {mask}");
                    assert_eq!(
                        rows[1].contains(&"💬 Support Group"),
                        support_button,
                        "mask {mask}"
                    );
                }
                assert_eq!(
                    rows.last().unwrap() == &vec!["☕️ Support Maintainer"],
                    support,
                    "mask {mask}"
                );
            }
        }
    }

    #[test]
    fn test_urls_use_raw_codename() {
        let record = DeviceRecord {
            codename: "a_b-c".to_string(),
            ..panther()
        };
        let announcement = compose(&record, &AnnouncementConfig::default());
        assert!(announcement.caption.contains("\\(a\\_b\\-c\\)"));
        assert_eq!(
            announcement.rows[0][1].url,
            "https://risingosrevived.tech/downloads.html?codename=a_b-c"
        );
        assert_eq!(announcement.rows[1][0].url, "https://t.me/RisingOSa_b-c");
        for button in announcement.rows.iter().flatten() {
            assert!(!button.url.contains('\\'), "{}", button.url);
        }
    }

    #[test]
    fn test_download_url_encodes_query_characters() {
        let record = DeviceRecord {
            codename: "a&b #c".to_string(),
            ..panther()
        };
        let announcement = compose(&record, &AnnouncementConfig::default());
        let url = &announcement.rows[0][1].url;
        assert_eq!(
            url,
            "https://risingosrevived.tech/downloads.html?codename=a%26b+%23c"
        );

        let parsed = Url::parse(url).unwrap();
        let pairs: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
        assert_eq!(pairs, vec![("codename".to_string(), "a&b #c".to_string())]);
    }
}
