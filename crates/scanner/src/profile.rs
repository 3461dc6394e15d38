use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub const MAX_THREAT_SCORE: u8 = 5;
pub const MAX_CONFIDENCE: u8 = 99;
const BASE_CONFIDENCE: u32 = 60;
const CONFIDENCE_PER_POINT: u32 = 8;
const NO_FLAGS_EXPLANATION: &str = "No major red flags detected.";

/// Public profile attributes the scorer looks at.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSnapshot {
    pub username: String,
    pub followers: u64,
    pub posts: u64,
    #[serde(default)]
    pub bio: Option<String>,
    /// Whether the profile photo was flagged as AI-generated.
    #[serde(default)]
    pub synthetic_photo: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Verdict {
    Real,
    Suspicious,
    #[serde(rename = "Likely Fake")]
    LikelyFake,
}

impl Verdict {
    pub fn from_points(points: u32) -> Self {
        match points {
            0..=1 => Verdict::Real,
            2..=3 => Verdict::Suspicious,
            _ => Verdict::LikelyFake,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Real => "Real",
            Verdict::Suspicious => "Suspicious",
            Verdict::LikelyFake => "Likely Fake",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub threat_score: u8,
    pub verdict: Verdict,
    /// Percent.
    pub confidence: u8,
    pub explanation: String,
}

struct Rule {
    weight: u32,
    reason: &'static str,
    fires: fn(&ProfileSnapshot) -> bool,
}

const RULES: &[Rule] = &[
    Rule {
        weight: 2,
        reason: "Profile photo detected as AI-generated.",
        fires: |profile| profile.synthetic_photo,
    },
    Rule {
        weight: 1,
        reason: "Very few followers.",
        fires: |profile| profile.followers < 20,
    },
    Rule {
        weight: 1,
        reason: "Very few posts.",
        fires: |profile| profile.posts < 2,
    },
    Rule {
        weight: 1,
        reason: "Bio is empty or suspicious.",
        fires: |profile| bio_is_suspicious(profile.bio.as_deref()),
    },
    Rule {
        weight: 1,
        reason: "Username contains suspicious patterns.",
        fires: |profile| username_is_suspicious(&profile.username),
    },
];

/// Scores a profile against the fixed-weight checklist.
///
/// The raw point total decides the verdict; the reported threat score and
/// confidence are clamped.
pub fn analyze_profile(profile: &ProfileSnapshot) -> ScanResult {
    let fired: Vec<&Rule> = RULES.iter().filter(|rule| (rule.fires)(profile)).collect();
    let points: u32 = fired.iter().map(|rule| rule.weight).sum();
    let explanation = if fired.is_empty() {
        NO_FLAGS_EXPLANATION.to_string()
    } else {
        fired
            .iter()
            .map(|rule| rule.reason)
            .collect::<Vec<_>>()
            .join(" ")
    };
    let confidence = (BASE_CONFIDENCE + points * CONFIDENCE_PER_POINT).min(MAX_CONFIDENCE as u32);

    ScanResult {
        threat_score: points.min(MAX_THREAT_SCORE as u32) as u8,
        verdict: Verdict::from_points(points),
        confidence: confidence as u8,
        explanation,
    }
}

fn suspicious_bio_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"dm me|😘|🔥|^\W+$").expect("bio pattern is valid"))
}

fn bio_is_suspicious(bio: Option<&str>) -> bool {
    match bio {
        None => true,
        Some(bio) if bio.trim().is_empty() => true,
        Some(bio) => suspicious_bio_pattern().is_match(&bio.to_lowercase()),
    }
}

fn username_is_suspicious(username: &str) -> bool {
    username
        .chars()
        .any(|ch| ch == '_' || ch.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(username: &str, followers: u64, posts: u64, bio: Option<&str>) -> ProfileSnapshot {
        ProfileSnapshot {
            username: username.to_string(),
            followers,
            posts,
            bio: bio.map(str::to_string),
            synthetic_photo: false,
        }
    }

    #[test]
    fn established_profile_is_real() {
        let result = analyze_profile(&profile("jane.doe", 540, 120, Some("Hiking and film")));
        assert_eq!(result.threat_score, 0);
        assert_eq!(result.verdict, Verdict::Real);
        assert_eq!(result.confidence, 60);
        assert_eq!(result.explanation, "No major red flags detected.");
    }

    #[test]
    fn demo_profile_is_likely_fake() {
        let mut snapshot = profile("girl_88_293", 14, 0, Some("DM me for fun! 😘🔥"));
        snapshot.synthetic_photo = true;
        let result = analyze_profile(&snapshot);
        assert_eq!(result.threat_score, 5);
        assert_eq!(result.verdict, Verdict::LikelyFake);
        assert_eq!(result.confidence, 99);
        assert_eq!(
            result.explanation,
            "Profile photo detected as AI-generated. Very few followers. Very few posts. \
             Bio is empty or suspicious. Username contains suspicious patterns."
        );
    }

    #[test]
    fn two_points_is_suspicious() {
        let result = analyze_profile(&profile("sam", 10, 1, Some("Gardener")));
        assert_eq!(result.threat_score, 2);
        assert_eq!(result.verdict, Verdict::Suspicious);
        assert_eq!(result.confidence, 76);
    }

    #[test]
    fn bio_rules() {
        assert!(bio_is_suspicious(None));
        assert!(bio_is_suspicious(Some("   ")));
        assert!(bio_is_suspicious(Some("!!! ...")));
        assert!(bio_is_suspicious(Some("Just DM ME")));
        assert!(!bio_is_suspicious(Some("Coffee & books")));
    }

    #[test]
    fn username_rules() {
        assert!(username_is_suspicious("anna_b"));
        assert!(username_is_suspicious("anna1990"));
        assert!(!username_is_suspicious("anna.b"));
    }

    #[test]
    fn scores_stay_in_range_for_every_rule_combination() {
        for mask in 0u32..32 {
            let snapshot = ProfileSnapshot {
                username: if mask & 1 != 0 { "a_1" } else { "ab" }.to_string(),
                followers: if mask & 2 != 0 { 0 } else { 500 },
                posts: if mask & 4 != 0 { 0 } else { 50 },
                bio: if mask & 8 != 0 { None } else { Some("Painter".to_string()) },
                synthetic_photo: mask & 16 != 0,
            };
            let result = analyze_profile(&snapshot);
            assert!(result.threat_score <= MAX_THREAT_SCORE);
            assert!((60..=MAX_CONFIDENCE).contains(&result.confidence));
        }
    }

    #[test]
    fn verdict_mapping_is_monotonic() {
        let verdicts: Vec<Verdict> = (0..=6).map(Verdict::from_points).collect();
        assert_eq!(
            verdicts,
            vec![
                Verdict::Real,
                Verdict::Real,
                Verdict::Suspicious,
                Verdict::Suspicious,
                Verdict::LikelyFake,
                Verdict::LikelyFake,
                Verdict::LikelyFake,
            ]
        );
    }

    #[test]
    fn scan_result_serializes_like_the_web_client_expects() {
        let result = analyze_profile(&profile("sam", 10, 1, Some("Gardener")));
        let value = serde_json::to_value(&result).expect("serialize");
        assert_eq!(value["threatScore"], 2);
        assert_eq!(value["verdict"], "Suspicious");
        let fake = serde_json::to_value(Verdict::LikelyFake).expect("serialize");
        assert_eq!(fake, "Likely Fake");
    }
}
