use std::fmt;

/// Integer printed with `'` between groups of three digits, e.g. `1'234'567`.
#[derive(Clone, Copy, Debug)]
pub struct NiceInt(i128);

impl NiceInt {
    pub fn from(value: impl Into<i128>) -> Self {
        Self(value.into())
    }

    pub fn from_usize(value: usize) -> Self {
        Self(value as i128)
    }
}

impl fmt::Display for NiceInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut result = String::with_capacity(digits.len() * 4 / 3 + 1);
        if self.0 < 0 {
            result.push('-');
        }
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                result.push('\'');
            }
            result.push(c);
        }
        f.pad(&result)
    }
}

#[cfg(test)]
mod tests {
    use super::NiceInt;

    #[test]
    fn test_delimiters() {
        assert_eq!(NiceInt::from(0).to_string(), "0");
        assert_eq!(NiceInt::from(999).to_string(), "999");
        assert_eq!(NiceInt::from(1000).to_string(), "1'000");
        assert_eq!(NiceInt::from_usize(1_234_567).to_string(), "1'234'567");
        assert_eq!(NiceInt::from(-45_000i64).to_string(), "-45'000");
        assert_eq!(format!("{:>7}", NiceInt::from(1234)), "  1'234");
    }
}
