// common/src/utils.rs
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use uuid::Uuid;

/// Setup tracing for consistent logging across the workspace
pub fn setup_tracing() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

/// Hex-encode `byte_len` bytes drawn from the operating system's CSPRNG
pub fn generate_hex_token(byte_len: usize) -> String {
    let mut bytes = vec![0u8; byte_len];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Anonymous session identifier: creation time in millis plus a random component
pub fn generate_session_id(now_millis: i64) -> String {
    let random_part = Uuid::new_v4().simple().to_string();
    format!("sess_{}_{}", now_millis, &random_part[..9])
}
