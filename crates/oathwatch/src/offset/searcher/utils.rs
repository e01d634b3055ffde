//! Utility functions for chain recovery

use crate::memory::layout::limits;

/// A resolved address a 32-bit user-mode pointer could plausibly hold.
pub fn is_plausible_user_address(address: u64) -> bool {
    (limits::MIN_USER_ADDRESS..=limits::MAX_USER_ADDRESS).contains(&address)
}

/// Low addresses are inside the module image and survive restarts.
pub fn is_static_address(address: u64) -> bool {
    address < limits::STATIC_ADDRESS_CEILING
}

/// Character names: 1 to 20 letters, digits or spaces in any alphabet.
pub fn is_valid_name(name: &str) -> bool {
    let count = name.chars().count();
    (1..=limits::MAX_NAME_CHARS).contains(&count)
        && name.chars().all(|c| c.is_alphanumeric() || c.is_whitespace())
}

/// `start, start + step, ...` strictly below `start + len`, ending early
/// rather than wrapping past `u64::MAX`.
pub fn aligned_steps(start: u64, len: u64, step: u64) -> impl Iterator<Item = u64> {
    (0..len.div_ceil(step)).map_while(move |i| {
        i.checked_mul(step)
            .and_then(|offset| start.checked_add(offset))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_address_bounds() {
        assert!(is_plausible_user_address(0x0040_0000));
        assert!(is_plausible_user_address(0x7FFF_FFFF));
        assert!(!is_plausible_user_address(0x003F_FFFF));
        assert!(!is_plausible_user_address(0x8000_0000));
    }

    #[test]
    fn test_names() {
        assert!(is_valid_name("Liễ Như Yên"));
        assert!(is_valid_name("Player01"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("abcdefghijklmnopqrstu"));
        assert!(!is_valid_name("bad#name"));
    }

    #[test]
    fn test_aligned_steps() {
        let steps: Vec<u64> = aligned_steps(100, 10, 4).collect();
        assert_eq!(steps, vec![100, 104, 108]);
        assert_eq!(aligned_steps(0, 0, 4).count(), 0);
    }

    #[test]
    fn test_aligned_steps_stop_at_address_space_end() {
        let steps: Vec<u64> = aligned_steps(u64::MAX - 8, 100, 4).collect();
        assert_eq!(steps, vec![u64::MAX - 8, u64::MAX - 4, u64::MAX]);
        assert_eq!(aligned_steps(u64::MAX, u64::MAX, 4).count(), 1);
    }
}
