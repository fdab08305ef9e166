use chrono::Utc;
use rand::Rng;

pub const REPORT_ID_PREFIX: &str = "report_";

const SUFFIX_LEN: usize = 9;
const SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// `report_<unix millis>_<9 random base36 chars>`. The timestamp orders ids
/// roughly by creation; the suffix separates ids minted in the same
/// millisecond.
pub fn generate_report_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_CHARSET[rng.gen_range(0..SUFFIX_CHARSET.len())] as char)
        .collect();
    format!(
        "{REPORT_ID_PREFIX}{}_{suffix}",
        Utc::now().timestamp_millis()
    )
}
