//! Password policy and credential hashing.

/// Minimum acceptable strength score (0..=4 scale).
const MIN_SCORE: u8 = 2;

/// Passwords rejected outright regardless of what the heuristic would say.
const COMMON_PASSWORDS: &[&str] = &[
    "password", "password1", "123456", "1234567", "12345678", "123456789", "qwerty", "abc123",
    "letmein", "iloveyou", "admin", "welcome", "monkey", "dragon", "sunshine", "princess",
    "football", "baseball", "master", "superman",
];

/// Result of scoring a candidate password.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub acceptable: bool,
    pub reason: Option<String>,
}

impl Evaluation {
    fn accept() -> Self {
        Self {
            acceptable: true,
            reason: None,
        }
    }

    fn reject(reason: &str) -> Self {
        Self {
            acceptable: false,
            reason: Some(reason.to_string()),
        }
    }
}

/// Score a candidate password and reject anything below the minimum.
/// Pure function of its input.
pub fn evaluate(candidate: &str) -> Evaluation {
    if candidate.is_empty() {
        return Evaluation::reject("Enter a password");
    }

    let lowered = candidate.to_lowercase();
    if COMMON_PASSWORDS.contains(&lowered.as_str()) {
        return Evaluation::reject("That password is too common. Try again!");
    }

    if score(candidate) < MIN_SCORE {
        return Evaluation::reject("Password too weak. Try again!");
    }

    Evaluation::accept()
}

/// Composite strength heuristic: length plus character-class diversity,
/// with penalties for single-class and repeated-character passwords.
fn score(password: &str) -> u8 {
    let length = password.chars().count();
    let length_points: i32 = match length {
        0..=5 => 0,
        6..=9 => 1,
        10..=13 => 2,
        _ => 3,
    };

    let has_lower = password.chars().any(|c| c.is_lowercase());
    let has_upper = password.chars().any(|c| c.is_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| !c.is_alphanumeric());
    let classes =
        [has_lower, has_upper, has_digit, has_symbol].iter().filter(|&&b| b).count() as i32;

    let mut points = length_points + (classes - 1).max(0);

    // A long run of one repeated character is no better than a short password
    let mut chars = password.chars();
    let first = chars.next();
    if let Some(first) = first {
        if chars.all(|c| c == first) {
            points = 0;
        }
    }
    if classes <= 1 && length < 12 {
        points -= 1;
    }

    points.clamp(0, 4) as u8
}

/// Hash with a freshly generated per-credential salt.
pub fn hash_password(plain: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(plain, bcrypt::DEFAULT_COST)
}

/// Verify a plaintext against a stored hash via the library's comparison.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    bcrypt::verify(plain, hash).unwrap_or(false)
}
