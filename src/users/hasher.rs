use md4::Md4;
use md5::Md5;
use ripemd::Ripemd160;
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512, Sha512_224, Sha512_256};
use whirlpool::Whirlpool;
use std::fmt;
use std::str::FromStr;

/// Digest algorithms accepted for password hashing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashAlgorithm {
    Md4,
    Md5,
    Ripemd160,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    #[default]
    Sha512,
    Sha512_224,
    Sha512_256,
    Whirlpool,
}

impl HashAlgorithm {
    pub fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Md4 => "md4",
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Ripemd160 => "ripemd160",
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha224 => "sha224",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
            HashAlgorithm::Sha512_224 => "sha512-224",
            HashAlgorithm::Sha512_256 => "sha512-256",
            HashAlgorithm::Whirlpool => "whirlpool",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts the plain names as well as the OpenSSL spellings
/// (`RSA-SHA512`, `sha512WithRSAEncryption`, `ripemd160WithRSA`, `ssl3-md5`,
/// `dss1`, ...).
impl FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        let base = lowered
            .strip_prefix("rsa-")
            .or_else(|| lowered.strip_suffix("withrsaencryption"))
            .or_else(|| lowered.strip_suffix("withrsa"))
            .unwrap_or(lowered.as_str());

        match base {
            "md4" => Ok(HashAlgorithm::Md4),
            "md5" | "ssl2-md5" | "ssl3-md5" => Ok(HashAlgorithm::Md5),
            "ripemd" | "ripemd160" | "rmd160" => Ok(HashAlgorithm::Ripemd160),
            "sha1" | "sha1-2" | "ssl3-sha1" | "dss1" | "dsa-sha" | "dsa-sha1" | "dsa-sha1-old"
            | "dsawithsha" | "dsawithsha1" | "ecdsa-with-sha1" => Ok(HashAlgorithm::Sha1),
            "sha224" => Ok(HashAlgorithm::Sha224),
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha384" => Ok(HashAlgorithm::Sha384),
            "sha512" => Ok(HashAlgorithm::Sha512),
            "sha512-224" | "sha512_224" => Ok(HashAlgorithm::Sha512_224),
            "sha512-256" | "sha512_256" => Ok(HashAlgorithm::Sha512_256),
            "whirlpool" => Ok(HashAlgorithm::Whirlpool),
            _ => Err(format!("unsupported hash algorithm: {}", s)),
        }
    }
}

/// Deterministic one-way digest producing lowercase hex
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordHasher {
    algorithm: HashAlgorithm,
}

impl PasswordHasher {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn hash(&self, input: &str) -> String {
        let bytes = input.as_bytes();
        match self.algorithm {
            HashAlgorithm::Md4 => hex::encode(Md4::digest(bytes)),
            HashAlgorithm::Md5 => hex::encode(Md5::digest(bytes)),
            HashAlgorithm::Ripemd160 => hex::encode(Ripemd160::digest(bytes)),
            HashAlgorithm::Sha1 => hex::encode(Sha1::digest(bytes)),
            HashAlgorithm::Sha224 => hex::encode(Sha224::digest(bytes)),
            HashAlgorithm::Sha256 => hex::encode(Sha256::digest(bytes)),
            HashAlgorithm::Sha384 => hex::encode(Sha384::digest(bytes)),
            HashAlgorithm::Sha512 => hex::encode(Sha512::digest(bytes)),
            HashAlgorithm::Sha512_224 => hex::encode(Sha512_224::digest(bytes)),
            HashAlgorithm::Sha512_256 => hex::encode(Sha512_256::digest(bytes)),
            HashAlgorithm::Whirlpool => hex::encode(Whirlpool::digest(bytes)),
        }
    }
}
