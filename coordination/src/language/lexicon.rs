//! Fixed lexicon of romanized Hindi words used to spot Hinglish.
//!
//! Entries are lowercase and deliberately exclude spellings that collide
//! with common English words ("the", "main", "to", "par"). Changing this
//! list changes detection behavior.

pub const HINGLISH_LEXICON: &[&str] = &[
    "hai", "hain", "ho", "hoga", "hogi", "hota", "hoti", "hote", "tha", "thi", "kya", "kyu",
    "kyun", "kyon", "kaise", "kaisa", "kaisi", "kaun", "kab", "kahan", "kitna", "kitne", "nahi",
    "nahin", "mein", "mujhe", "mera", "meri", "mere", "tum", "tumhe", "aap", "aapko", "hum",
    "humein", "ko", "ka", "ki", "ke", "se", "aur", "bhi", "yeh", "ye", "woh", "wo", "kar",
    "karo", "karna", "karte", "karke", "samjhao", "samjha", "samajh", "batao", "bataiye",
    "matlab", "accha", "acha", "theek", "thik", "kuch", "sab", "bahut", "zyada", "jyada",
    "kam", "padhai", "padhna", "sawal", "jawab", "lekin", "toh", "sirf", "abhi", "phir",
    "chahiye", "wala", "wali", "raha", "rahi", "rahe", "gaya", "gayi", "diya", "liya", "dekho",
    "suno", "yaar", "bhai", "kyunki", "isliye", "agar", "waise", "jaise", "kaunsa",
];

/// Whether `word` (already lowercased, stripped of punctuation) is in the lexicon.
pub fn is_hinglish_word(word: &str) -> bool {
    HINGLISH_LEXICON.contains(&word)
}
