//! Partial redaction of contact identifiers returned to non-owners.

/// Mask an email address.
///
/// The local part keeps its first character when it is a single character and
/// its first two otherwise. The first host label keeps its first character.
/// Every masked character becomes `*`; later host labels are left as they are.
///
/// ```
/// use tessera_domain::masking::mask_email;
///
/// assert_eq!(mask_email("alice@example.com"), "al***@e******.com");
/// ```
pub fn mask_email(address: &str) -> String {
    let Some((local, host)) = address.rsplit_once('@') else {
        return mask_keeping(address, 2);
    };

    let keep_local = if local.chars().count() == 1 { 1 } else { 2 };
    let masked_local = mask_keeping(local, keep_local);

    let masked_host = match host.split_once('.') {
        Some((first, rest)) => format!("{}.{rest}", mask_keeping(first, 1)),
        None => mask_keeping(host, 1),
    };

    format!("{masked_local}@{masked_host}")
}

/// Mask a phone number down to its last two characters.
pub fn mask_phone_number(number: &str) -> String {
    let len = number.chars().count();
    number.chars().skip(len.saturating_sub(2)).collect()
}

fn mask_keeping(s: &str, keep: usize) -> String {
    s.chars()
        .enumerate()
        .map(|(i, c)| if i < keep { c } else { '*' })
        .collect()
}
