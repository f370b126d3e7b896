use rand::RngCore;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Bytes of entropy in a form token
const TOKEN_BYTES: usize = 16;

struct IssuedToken {
    value: String,
    issued_at: Instant,
}

/// One-time form tokens, at most one live token per browser session
pub struct SubmissionGate {
    tokens: Mutex<HashMap<String, IssuedToken>>,
    session_ttl: Duration,
}

fn mint_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

impl SubmissionGate {
    pub fn new(session_ttl: Duration) -> Self {
        Self {
            tokens: Mutex::new(HashMap::new()),
            session_ttl,
        }
    }

    /// Mint a token for the session, replacing any unconsumed one
    pub async fn issue(&self, session: &str) -> String {
        let token = mint_token();
        let mut tokens = self.tokens.lock().await;

        let ttl = self.session_ttl;
        let before = tokens.len();
        tokens.retain(|_, issued| issued.issued_at.elapsed() < ttl);
        if tokens.len() < before {
            tracing::debug!("Pruned {} stale form sessions", before - tokens.len());
        }

        tokens.insert(
            session.to_string(),
            IssuedToken {
                value: token.clone(),
                issued_at: Instant::now(),
            },
        );

        token
    }

    /// Consume the session's token if `presented` matches it.
    ///
    /// Succeeds at most once per issued token, and never once the
    /// session has outlived its TTL.
    pub async fn consume_if_valid(&self, session: &str, presented: &str) -> bool {
        let mut tokens = self.tokens.lock().await;

        match tokens.get(session) {
            Some(issued) if issued.issued_at.elapsed() >= self.session_ttl => {
                tokens.remove(session);
                tracing::debug!("Form session expired before submission");
                false
            }
            Some(issued) if !presented.is_empty() && issued.value == presented => {
                tokens.remove(session);
                true
            }
            _ => false,
        }
    }

    #[cfg(test)]
    pub async fn live_sessions(&self) -> usize {
        self.tokens.lock().await.len()
    }
}
