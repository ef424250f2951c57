use std::path::PathBuf;
use std::{env, fs};

use jsonwebtoken::{DecodingKey, EncodingKey};

use crate::error::SecurityError;

const SESSION_PUBLIC: &str = "session.pem.pub";
const SESSION_PRIVATE: &str = "session.pem";

#[derive(Debug, Clone)]
pub struct KeySet {
    pub public: Vec<u8>,
    pub private: Vec<u8>,
}

/// Keys used to sign and verify session tokens.
#[derive(Clone)]
pub struct Security {
    pub session_keys: KeySet,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl std::fmt::Debug for Security {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Security")
    }
}

#[inline]
fn security_dir() -> PathBuf {
    PathBuf::from(env::var("SECURITY_DIR").unwrap_or("./security".to_string()))
}

impl Security {
    pub fn load() -> Result<Security, SecurityError> {
        let dir = security_dir();

        tracing::info!("Loading session signing keys...");
        let pub_key = fs::read(dir.join(SESSION_PUBLIC)).ok();
        let priv_key = fs::read(dir.join(SESSION_PRIVATE)).ok();

        let keys = match (pub_key, priv_key) {
            (Some(public), Some(private)) => {
                tracing::info!("Loaded session signing keys.");
                KeySet { public, private }
            }
            #[cfg(feature = "generate-security")]
            _ => {
                tracing::info!(
                    "Unable to load private and/or public session key(s). Generating a new pair."
                );
                fs::create_dir_all(&dir)?;

                tracing::info!("Generating a private RSA key. This will take a few minutes...");
                let keys = Security::generate_keys(4096)?;

                fs::write(dir.join(SESSION_PRIVATE), keys.private.as_slice())?;
                fs::write(dir.join(SESSION_PUBLIC), keys.public.as_slice())?;
                tracing::info!("Done generating session signing keys.");

                keys
            }
            #[cfg(not(feature = "generate-security"))]
            _ => return Err(SecurityError::MissingKeys(dir)),
        };

        Security::from_keys(keys)
    }

    pub fn from_keys(keys: KeySet) -> Result<Security, SecurityError> {
        let encoding = EncodingKey::from_rsa_pem(&keys.private)?;
        let decoding = DecodingKey::from_rsa_pem(&keys.public)?;

        Ok(Security {
            session_keys: keys,
            encoding,
            decoding,
        })
    }

    /// PKCS#1 private and SPKI public key in PEM form, as PS256 expects them.
    #[cfg(feature = "generate-security")]
    pub fn generate_keys(bits: usize) -> Result<KeySet, SecurityError> {
        use rsa::pkcs1::{EncodeRsaPrivateKey, LineEnding};
        use rsa::pkcs8::EncodePublicKey;

        let mut rng = rand::thread_rng();
        let rsa_sk = rsa::RsaPrivateKey::new(&mut rng, bits)
            .map_err(|e| SecurityError::Generation(e.to_string()))?;

        let private = rsa_sk
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|e| SecurityError::Generation(e.to_string()))?
            .to_string()
            .into_bytes();

        let public = rsa_sk
            .to_public_key()
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| SecurityError::Generation(e.to_string()))?
            .into_bytes();

        Ok(KeySet { public, private })
    }

    pub fn encoding_key(&self) -> &EncodingKey {
        &self.encoding
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding
    }
}

/// Key generation is slow, tests share one small pair.
#[cfg(test)]
pub(crate) fn test_security() -> Security {
    lazy_static! {
        static ref KEYS: KeySet =
            Security::generate_keys(2048).expect("unable to generate test keys");
    }

    Security::from_keys(KEYS.clone()).expect("generated keys must be valid")
}
