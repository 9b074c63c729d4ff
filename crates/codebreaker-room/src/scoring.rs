//! Secret generation and guess feedback.

use rand::Rng;

/// Feedback for one guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    /// Digits present anywhere in the secret, positional hits included.
    pub correct_count: usize,
    /// Digits in exactly the right position.
    pub correct_position_count: usize,
}

/// Draws `digit_count` digits uniformly from 0-9. Repeats are allowed.
pub fn generate_secret(digit_count: u8) -> Vec<u8> {
    let mut rng = rand::rng();
    (0..digit_count).map(|_| rng.random_range(0..=9)).collect()
}

/// Scores `guess` against `secret`.
///
/// Exact matches are counted and consumed first, then each remaining
/// guess digit consumes the first unconsumed secret digit of the same
/// value. A length mismatch is scored over the shorter prefix.
pub fn score_guess(secret: &[u8], guess: &[u8]) -> Score {
    let len = secret.len().min(guess.len());
    let (secret, guess) = (&secret[..len], &guess[..len]);

    let mut secret_used = vec![false; len];
    let mut guess_used = vec![false; len];
    let mut correct_position_count = 0;

    for i in 0..len {
        if guess[i] == secret[i] {
            correct_position_count += 1;
            secret_used[i] = true;
            guess_used[i] = true;
        }
    }

    let mut partial = 0;
    for (i, digit) in guess.iter().enumerate() {
        if guess_used[i] {
            continue;
        }
        let hit = (0..len).find(|&j| !secret_used[j] && secret[j] == *digit);
        if let Some(j) = hit {
            secret_used[j] = true;
            partial += 1;
        }
    }

    Score {
        correct_count: correct_position_count + partial,
        correct_position_count,
    }
}
