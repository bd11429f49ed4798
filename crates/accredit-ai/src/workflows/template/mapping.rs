use crate::workflows::assessment::DetailItemKind;

/// Map a template row's type label onto a matrix row kind. Labels are
/// matched case-insensitively and a handful of spreadsheet aliases are
/// accepted alongside the canonical names.
pub(crate) fn kind_from_label(label: &str) -> Option<DetailItemKind> {
    let normalized = label.trim().to_ascii_lowercase().replace([' ', '-'], "_");
    let kind = match normalized.as_str() {
        "guidance" => DetailItemKind::Guidance,
        "indicator" => DetailItemKind::Indicator,
        "description" => DetailItemKind::Description,
        "element" => DetailItemKind::Element,
        "criterion" | "k" => DetailItemKind::Criterion,
        "score_band_0" | "score_0" => DetailItemKind::ScoreBand0,
        "score_band_1" | "score_1" => DetailItemKind::ScoreBand1,
        "score_band_2" | "score_2" => DetailItemKind::ScoreBand2,
        "score_band_3" | "score_3" => DetailItemKind::ScoreBand3,
        "score_band_4" | "score_4" => DetailItemKind::ScoreBand4,
        _ => return None,
    };
    Some(kind)
}

#[cfg(test)]
pub(crate) fn lookup_for_tests(label: &str) -> Option<DetailItemKind> {
    kind_from_label(label)
}
