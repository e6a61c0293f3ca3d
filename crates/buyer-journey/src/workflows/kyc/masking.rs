use super::domain::PersonalInfo;

const VISIBLE_EDGE: usize = 2;
const FULL_MASK: &str = "****";

/// Hide all but the first and last two characters. Values of four characters or fewer are
/// replaced entirely.
pub fn mask_sensitive_data(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= VISIBLE_EDGE * 2 {
        return FULL_MASK.to_string();
    }

    let hidden = chars.len() - VISIBLE_EDGE * 2;
    let mut masked = String::with_capacity(value.len());
    masked.extend(&chars[..VISIBLE_EDGE]);
    masked.extend(std::iter::repeat('*').take(hidden));
    masked.extend(&chars[chars.len() - VISIBLE_EDGE..]);
    masked
}

/// Copy of the applicant's form data safe to return to clients.
pub fn masked_personal_info(info: &PersonalInfo) -> PersonalInfo {
    PersonalInfo {
        pps_number: info.pps_number.as_deref().map(mask_sensitive_data),
        id_number: info.id_number.as_deref().map(mask_sensitive_data),
        ..info.clone()
    }
}
