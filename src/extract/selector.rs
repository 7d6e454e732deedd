//! Format selection policy: which stream variant gets transcribed.

use super::FormatCandidate;
use crate::ScribeError;

/// The audio candidate pool a source offers.
///
/// Audio-only variants are preferred outright; only when the source offers
/// none does the pool widen to anything whose audio codec is not explicitly
/// absent.
pub fn audio_candidates(candidates: &[FormatCandidate]) -> Vec<&FormatCandidate> {
    let audio_only: Vec<&FormatCandidate> = candidates
        .iter()
        .filter(|c| c.is_audio_only())
        .collect();

    if !audio_only.is_empty() {
        return audio_only;
    }

    candidates.iter().filter(|c| c.has_audio()).collect()
}

/// Pick the variant to fetch: highest bitrate in the audio pool, first wins ties
pub fn select_best_audio(candidates: &[FormatCandidate]) -> Result<&FormatCandidate, ScribeError> {
    let mut best: Option<&FormatCandidate> = None;

    for candidate in audio_candidates(candidates) {
        match best {
            // Strictly greater, so the earliest of equals is kept
            Some(current) if candidate.bitrate() > current.bitrate() => best = Some(candidate),
            None => best = Some(candidate),
            _ => {}
        }
    }

    best.ok_or(ScribeError::NoSuitableFormat)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(
        format_id: &str,
        acodec: Option<&str>,
        vcodec: Option<&str>,
        abr: Option<f64>,
    ) -> FormatCandidate {
        FormatCandidate {
            format_id: format_id.to_string(),
            acodec: acodec.map(|s| s.to_string()),
            vcodec: vcodec.map(|s| s.to_string()),
            abr,
            ext: None,
            format_note: None,
        }
    }

    #[test]
    fn prefers_highest_bitrate_audio_only() {
        let candidates = vec![
            candidate("140", Some("mp4a.40.2"), Some("none"), Some(129.5)),
            candidate("251", Some("opus"), Some("none"), Some(160.0)),
            candidate("250", Some("opus"), Some("none"), Some(70.0)),
        ];

        let best = select_best_audio(&candidates).unwrap();
        assert_eq!(best.format_id, "251");
    }

    #[test]
    fn audio_only_beats_richer_muxed_variants() {
        // The muxed variant advertises more audio bitrate but carries video
        let candidates = vec![
            candidate("22", Some("mp4a.40.2"), Some("avc1"), Some(192.0)),
            candidate("250", Some("opus"), Some("none"), Some(70.0)),
        ];

        let best = select_best_audio(&candidates).unwrap();
        assert_eq!(best.format_id, "250");
    }

    #[test]
    fn falls_back_to_muxed_when_no_audio_only_exists() {
        let candidates = vec![
            candidate("sb0", Some("none"), Some("none"), None),
            candidate("18", Some("mp4a.40.2"), Some("avc1"), Some(96.0)),
            candidate("22", Some("mp4a.40.2"), Some("avc1"), Some(192.0)),
        ];

        let best = select_best_audio(&candidates).unwrap();
        assert_eq!(best.format_id, "22");
    }

    #[test]
    fn unreported_audio_codec_stays_eligible_in_fallback() {
        // Only an explicit "none" excludes a variant from the fallback pool
        let candidates = vec![
            candidate("210", Some("none"), Some("vp9"), None),
            candidate("raw", None, Some("avc1"), Some(64.0)),
        ];

        let best = select_best_audio(&candidates).unwrap();
        assert_eq!(best.format_id, "raw");
    }

    #[test]
    fn missing_bitrate_ranks_as_zero() {
        let candidates = vec![
            candidate("251", Some("opus"), Some("none"), None),
            candidate("250", Some("opus"), Some("none"), Some(1.0)),
        ];

        let best = select_best_audio(&candidates).unwrap();
        assert_eq!(best.format_id, "250");
    }

    #[test]
    fn equal_bitrates_keep_list_order() {
        let candidates = vec![
            candidate("first", Some("opus"), Some("none"), Some(128.0)),
            candidate("second", Some("opus"), Some("none"), Some(128.0)),
        ];

        let best = select_best_audio(&candidates).unwrap();
        assert_eq!(best.format_id, "first");
    }

    #[test]
    fn no_audio_at_all_is_an_error() {
        let candidates = vec![
            candidate("sb0", Some("none"), Some("none"), None),
            candidate("video", Some("none"), Some("vp9"), None),
        ];

        assert!(matches!(
            select_best_audio(&candidates),
            Err(ScribeError::NoSuitableFormat)
        ));
        assert!(matches!(
            select_best_audio(&[]),
            Err(ScribeError::NoSuitableFormat)
        ));
    }

    #[test]
    fn single_candidate_is_selected() {
        let candidates = vec![candidate("250", Some("opus"), Some("none"), Some(70.0))];

        let best = select_best_audio(&candidates).unwrap();
        assert_eq!(best.format_id, "250");
    }
}
