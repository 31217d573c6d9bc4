use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::db::Database;

/// URL-safe base64 alphabet used for secret keys.
const SECRET_KEY_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// 43 symbols of 6 bits each, matching a 32-byte url-safe token.
pub const SECRET_KEY_LENGTH: usize = 43;

/// Generate a random alphanumeric id.
pub fn generate_id(length: usize) -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Generate an id that no stored paste is using yet.
pub async fn generate_unique_id(db: &Database, length: usize) -> crate::ApiResult<String> {
    loop {
        let id = generate_id(length);
        if !db.paste_exists(&id).await? {
            return Ok(id);
        }
    }
}

/// Generate the secret key that authorizes deleting a paste.
pub fn generate_secret_key() -> String {
    let mut rng = OsRng;
    (0..SECRET_KEY_LENGTH)
        .filter_map(|_| SECRET_KEY_ALPHABET.choose(&mut rng))
        .map(|&b| char::from(b))
        .collect()
}
