use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::types::{Player, Position};

/// The six game-law properties judged by the external verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKey {
    BoardConsistency,
    Fairness,
    LegalMovesBlack,
    LegalMovesWhite,
    Termination,
    WinnerDetermination,
}

impl PropertyKey {
    pub const ALL: [PropertyKey; 6] = [
        Self::BoardConsistency,
        Self::Fairness,
        Self::LegalMovesBlack,
        Self::LegalMovesWhite,
        Self::Termination,
        Self::WinnerDetermination,
    ];

    /// The side a legal-moves key belongs to. `None` for shared properties.
    pub fn owner(self) -> Option<Player> {
        match self {
            Self::LegalMovesBlack => Some(Player::Black),
            Self::LegalMovesWhite => Some(Player::White),
            _ => None,
        }
    }
}

static PANEL_TITLES: Lazy<BTreeMap<PropertyKey, &'static str>> = Lazy::new(|| {
    BTreeMap::from([
        (PropertyKey::BoardConsistency, "Spec 1-Board Consistency"),
        (PropertyKey::Fairness, "Spec 2-Fairness"),
        (PropertyKey::LegalMovesBlack, "Black"),
        (PropertyKey::LegalMovesWhite, "White"),
        (PropertyKey::Termination, "Spec 4-Termination"),
        (PropertyKey::WinnerDetermination, "Spec 5-Winner Determination"),
    ])
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyStatus {
    Pass,
    Fail,
    Pending,
}

/// The verifier's judgment of a single property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyResult {
    pub status: PropertyStatus,
    #[serde(default)]
    pub details: String,
    /// Only present on legal-moves results; the discs the checked move flipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flipped_discs: Option<Vec<Position>>,
}

/// One partial report from the verifier. Each engine response carries only
/// the keys relevant to the mover that just acted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerificationReport {
    entries: BTreeMap<PropertyKey, PropertyResult>,
}

impl VerificationReport {
    pub fn insert(&mut self, key: PropertyKey, result: PropertyResult) {
        self.entries.insert(key, result);
    }

    pub fn get(&self, key: PropertyKey) -> Option<&PropertyResult> {
        self.entries.get(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PropertyKey, &PropertyResult)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Monotonic merge of every partial report seen since the last reset.
///
/// Merging is last-write-wins per key, except that a player-specific
/// legal-moves key is only overwritten when the report's mover matches that
/// key's player. A merge with no mover (manual full verification) is
/// unscoped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationCache {
    slots: BTreeMap<PropertyKey, PropertyResult>,
}

impl VerificationCache {
    pub fn merge(&mut self, report: &VerificationReport, mover: Option<Player>) {
        for (key, result) in report.iter() {
            if let (Some(owner), Some(mover)) = (key.owner(), mover) {
                if owner != mover {
                    continue;
                }
            }
            self.slots.insert(key, result.clone());
        }
    }

    pub fn get(&self, key: PropertyKey) -> Option<&PropertyResult> {
        self.slots.get(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

/// One rendered row of the verification panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelLine {
    pub label: String,
    pub status: Option<PropertyStatus>,
    pub text: String,
    pub indented: bool,
}

impl PanelLine {
    fn header(label: &str) -> Self {
        Self {
            label: label.to_string(),
            status: None,
            text: String::new(),
            indented: false,
        }
    }

    fn item(key: PropertyKey, result: &PropertyResult, indented: bool) -> Self {
        let mut text = result.details.clone();
        if let Some(owner) = key.owner() {
            let victim = owner.opponent().as_name();
            text.push_str(&format!(
                " flipped {victim} discs at: {}.",
                format_flipped(result.flipped_discs.as_deref())
            ));
        }
        Self {
            label: PANEL_TITLES[&key].to_string(),
            status: Some(result.status),
            text,
            indented,
        }
    }

    fn missing(key: PropertyKey, placeholder: &str) -> Self {
        Self {
            label: PANEL_TITLES[&key].to_string(),
            status: None,
            text: placeholder.to_string(),
            indented: true,
        }
    }
}

pub fn format_flipped(coords: Option<&[Position]>) -> String {
    match coords {
        None | Some([]) => "None".to_string(),
        Some(coords) => coords
            .iter()
            .map(Position::to_string)
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// Builds the panel contents from the cache, in fixed display order.
/// Shared properties are omitted until seen; the two legal-moves rows are
/// always present so a missing move reads as "No move yet".
pub fn panel_lines(cache: &VerificationCache) -> Vec<PanelLine> {
    let mut lines = Vec::new();

    for key in [PropertyKey::BoardConsistency, PropertyKey::Fairness] {
        if let Some(result) = cache.get(key) {
            lines.push(PanelLine::item(key, result, false));
        }
    }

    lines.push(PanelLine::header("Spec 3-Legal Moves:"));
    for key in [PropertyKey::LegalMovesBlack, PropertyKey::LegalMovesWhite] {
        match cache.get(key) {
            Some(result) => lines.push(PanelLine::item(key, result, true)),
            None => lines.push(PanelLine::missing(key, "No move yet.")),
        }
    }

    for key in [PropertyKey::Termination, PropertyKey::WinnerDetermination] {
        if let Some(result) = cache.get(key) {
            lines.push(PanelLine::item(key, result, false));
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(status: PropertyStatus, details: &str) -> PropertyResult {
        PropertyResult {
            status,
            details: details.to_string(),
            flipped_discs: None,
        }
    }

    fn report(entries: &[(PropertyKey, &str)]) -> VerificationReport {
        let mut report = VerificationReport::default();
        for (key, details) in entries {
            report.insert(*key, result(PropertyStatus::Pass, details));
        }
        report
    }

    #[test]
    fn report_deserializes_wire_keys() {
        let raw = r#"{
            "board_consistency": {"status": "pass", "details": "Board is consistent."},
            "legal_moves_black": {"status": "pass", "details": "Move verified.",
                                  "flipped_discs": [[3, 4], [4, 4]]}
        }"#;
        let report: VerificationReport = serde_json::from_str(raw).unwrap();

        assert!(report.get(PropertyKey::BoardConsistency).is_some());
        let black = report.get(PropertyKey::LegalMovesBlack).unwrap();
        assert_eq!(
            black.flipped_discs.as_deref(),
            Some(&[Position::new(3, 4), Position::new(4, 4)][..])
        );
    }

    #[test]
    fn merge_is_idempotent() {
        let report = report(&[
            (PropertyKey::BoardConsistency, "ok"),
            (PropertyKey::LegalMovesBlack, "black ok"),
        ]);

        let mut once = VerificationCache::default();
        once.merge(&report, Some(Player::Black));
        let mut twice = once.clone();
        twice.merge(&report, Some(Player::Black));

        assert_eq!(once, twice);
    }

    #[test]
    fn merge_scopes_legal_moves_to_the_mover() {
        let mut cache = VerificationCache::default();
        let black_report = report(&[
            (PropertyKey::LegalMovesBlack, "black move"),
            (PropertyKey::LegalMovesWhite, "sneaky white"),
        ]);
        cache.merge(&black_report, Some(Player::Black));

        assert_eq!(
            cache.get(PropertyKey::LegalMovesBlack).unwrap().details,
            "black move"
        );
        assert!(cache.get(PropertyKey::LegalMovesWhite).is_none());
    }

    #[test]
    fn unscoped_merge_updates_both_sides() {
        let mut cache = VerificationCache::default();
        let full = report(&[
            (PropertyKey::LegalMovesBlack, "black"),
            (PropertyKey::LegalMovesWhite, "white"),
            (PropertyKey::Termination, "not yet"),
        ]);
        cache.merge(&full, None);

        assert!(cache.get(PropertyKey::LegalMovesBlack).is_some());
        assert!(cache.get(PropertyKey::LegalMovesWhite).is_some());
        assert!(cache.get(PropertyKey::Termination).is_some());
    }

    // Property check: random interleavings of black/white partial reports
    // never cross-contaminate the per-player slots.
    #[test]
    fn interleaved_reports_never_cross_contaminate() {
        let mut seed = 0x2357_u32;
        let mut rand = move || {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            seed
        };

        for round in 0..200 {
            let mut cache = VerificationCache::default();
            let mut last_black = None;
            let mut last_white = None;

            for step in 0..16 {
                let mover = if rand() % 2 == 0 {
                    Player::Black
                } else {
                    Player::White
                };
                let tag = format!("r{round}s{step}");
                // Each partial report carries both legal-moves keys; only the
                // mover's key may land.
                let report = report(&[
                    (PropertyKey::LegalMovesBlack, &format!("black {tag}")),
                    (PropertyKey::LegalMovesWhite, &format!("white {tag}")),
                ]);
                cache.merge(&report, Some(mover));

                match mover {
                    Player::Black => last_black = Some(format!("black {tag}")),
                    Player::White => last_white = Some(format!("white {tag}")),
                }

                let black = cache.get(PropertyKey::LegalMovesBlack).map(|r| &r.details);
                let white = cache.get(PropertyKey::LegalMovesWhite).map(|r| &r.details);
                assert_eq!(black, last_black.as_ref());
                assert_eq!(white, last_white.as_ref());
            }
        }
    }

    #[test]
    fn panel_shows_placeholders_for_missing_moves() {
        let lines = panel_lines(&VerificationCache::default());

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].label, "Spec 3-Legal Moves:");
        assert_eq!(lines[1].text, "No move yet.");
        assert_eq!(lines[2].text, "No move yet.");
    }

    #[test]
    fn panel_appends_flipped_coordinates_to_legal_moves() {
        let mut cache = VerificationCache::default();
        let mut report = VerificationReport::default();
        report.insert(
            PropertyKey::LegalMovesBlack,
            PropertyResult {
                status: PropertyStatus::Pass,
                details: "Move verified.".to_string(),
                flipped_discs: Some(vec![Position::new(3, 4)]),
            },
        );
        cache.merge(&report, Some(Player::Black));

        let lines = panel_lines(&cache);
        let black = lines.iter().find(|l| l.label == "Black").unwrap();
        assert_eq!(black.text, "Move verified. flipped white discs at: (3, 4).");
        assert_eq!(black.status, Some(PropertyStatus::Pass));
    }

    #[test]
    fn cache_round_trips_through_json() {
        let mut cache = VerificationCache::default();
        cache.merge(
            &report(&[
                (PropertyKey::Fairness, "both sides saw 30 moves"),
                (PropertyKey::LegalMovesWhite, "white ok"),
            ]),
            Some(Player::White),
        );

        let blob = serde_json::to_string(&cache).unwrap();
        let back: VerificationCache = serde_json::from_str(&blob).unwrap();
        assert_eq!(cache, back);
    }
}
