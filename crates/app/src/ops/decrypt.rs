use clap::Args;
use common::crypto::EncryptedPayload;

use crate::state::{AppSessionError, StateError};

#[derive(Args, Debug, Clone)]
pub struct Decrypt {
    /// Peer the message came from
    pub peer_id: String,

    /// Base64 ciphertext
    #[arg(long, requires = "iv", conflicts_with = "payload")]
    pub ciphertext: Option<String>,

    /// Base64 nonce
    #[arg(long, requires = "ciphertext")]
    pub iv: Option<String>,

    /// Whole payload as printed by `encrypt`
    #[arg(long)]
    pub payload: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum DecryptError {
    #[error("decrypt failed: {0}")]
    State(#[from] StateError),
    #[error("decrypt failed: {0}")]
    Session(#[from] AppSessionError),
    #[error("decrypt failed: invalid payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("decrypt failed: pass either --payload or --ciphertext and --iv")]
    MissingInput,
}

impl Decrypt {
    fn payload(&self) -> Result<EncryptedPayload, DecryptError> {
        match (&self.payload, &self.ciphertext, &self.iv) {
            (Some(json), _, _) => Ok(serde_json::from_str(json)?),
            (None, Some(ciphertext), Some(iv)) => Ok(EncryptedPayload {
                ciphertext: ciphertext.clone(),
                iv: iv.clone(),
            }),
            _ => Err(DecryptError::MissingInput),
        }
    }
}

#[async_trait::async_trait]
impl crate::op::Op for Decrypt {
    type Error = DecryptError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let payload = self.payload()?;
        let session = ctx.state()?.open_session().await?;
        Ok(session.decrypt_from(&self.peer_id, &payload).await?)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn decrypt(payload: Option<&str>, ciphertext: Option<&str>, iv: Option<&str>) -> Decrypt {
        Decrypt {
            peer_id: "bob".to_string(),
            ciphertext: ciphertext.map(str::to_string),
            iv: iv.map(str::to_string),
            payload: payload.map(str::to_string),
        }
    }

    #[test]
    fn test_payload_from_parts() {
        let payload = decrypt(None, Some("Y3Q="), Some("aXY=")).payload().unwrap();
        assert_eq!(payload.ciphertext, "Y3Q=");
        assert_eq!(payload.iv, "aXY=");
    }

    #[test]
    fn test_payload_from_json() {
        let payload = decrypt(Some(r#"{"ciphertext":"Y3Q=","iv":"aXY="}"#), None, None)
            .payload()
            .unwrap();
        assert_eq!(payload.iv, "aXY=");
    }

    #[test]
    fn test_payload_missing() {
        assert!(matches!(
            decrypt(None, None, None).payload(),
            Err(DecryptError::MissingInput)
        ));
    }
}
