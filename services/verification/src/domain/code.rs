use rand::RngExt;

/// Number of digits in a verification code.
pub const CODE_LEN: usize = 6;

// Drawing from [100000, 999999] keeps every code at exactly six digits.
const CODE_MIN: u32 = 100_000;
const CODE_MAX: u32 = 999_999;

/// Source of fresh verification codes.
pub trait CodeGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Uniform six-digit codes from the thread-local CSPRNG (ChaCha, seeded and
/// periodically reseeded from the OS).
#[derive(Debug, Clone, Copy, Default)]
pub struct SecureCodeGenerator;

impl CodeGenerator for SecureCodeGenerator {
    fn generate(&self) -> String {
        rand::rng().random_range(CODE_MIN..=CODE_MAX).to_string()
    }
}

/// `true` if `code` has the shape of an issued code.
pub fn is_well_formed(code: &str) -> bool {
    code.len() == CODE_LEN && code.bytes().all(|b| b.is_ascii_digit())
}
