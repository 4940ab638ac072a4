//! Certificate metadata documents.
//!
//! Built on demand from an issued token and the holder's verification
//! evidence. The ledger only stores the opaque `metadata_uri`; hosting the
//! document is the job of an external content store.

use examcert_types::{CertificateToken, StudentRecord, Timestamp};
use serde::{Deserialize, Serialize};

/// Value placed in the `Certificate Type` attribute.
pub const CERTIFICATE_TYPE: &str = "Blockchain Exam Authentication";

/// Where generated documents point for images and the project page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetadataLinks {
    /// Prefix prepended to the evidence image hash, e.g. `https://ipfs.io/ipfs/`.
    pub image_gateway: String,
    pub external_url: String,
}

impl Default for MetadataLinks {
    fn default() -> Self {
        Self {
            image_gateway: "https://ipfs.io/ipfs/".to_string(),
            external_url: "https://blockchain-exam-auth.com".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataAttribute {
    pub trait_type: String,
    pub value: String,
}

impl MetadataAttribute {
    fn new(trait_type: &str, value: impl Into<String>) -> Self {
        Self {
            trait_type: trait_type.to_string(),
            value: value.into(),
        }
    }
}

/// NFT-style metadata document for one certificate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateMetadata {
    pub name: String,
    pub description: String,
    pub image: String,
    pub external_url: String,
    pub background_color: String,
    pub attributes: Vec<MetadataAttribute>,
}

impl CertificateMetadata {
    /// Build the document for `token`.
    ///
    /// `student` supplies the verification evidence (image hash, verification
    /// time); `exam_date` comes from the mint queue when the certificate was
    /// issued through it and falls back to the mint date otherwise.
    pub fn build(
        token: &CertificateToken,
        student: Option<&StudentRecord>,
        exam_date: Option<Timestamp>,
        links: &MetadataLinks,
    ) -> Self {
        let image_hash = student.map(|s| s.image_hash.as_str()).unwrap_or_default();
        let verification_time = student
            .and_then(|s| s.verification_time)
            .map(|t| t.to_rfc3339())
            .unwrap_or_default();
        let exam_date = exam_date.unwrap_or(token.mint_date);

        Self {
            name: format!("Exam Certificate - {}", token.student_id),
            description: format!("Certificate for {} exam", token.subject),
            image: format!("{}{}", links.image_gateway, image_hash),
            external_url: links.external_url.clone(),
            background_color: "000000".to_string(),
            attributes: vec![
                MetadataAttribute::new("Token ID", token.token_id.to_string()),
                MetadataAttribute::new("Student ID", token.student_id.clone()),
                MetadataAttribute::new("Subject", token.subject.clone()),
                MetadataAttribute::new("Exam Session", token.exam_session.clone()),
                MetadataAttribute::new("Score", token.score.to_string()),
                MetadataAttribute::new("Exam Date", exam_date.to_date_string()),
                MetadataAttribute::new("Verification Time", verification_time),
                MetadataAttribute::new("Mint Date", token.mint_date.to_rfc3339()),
                MetadataAttribute::new("IP Address", token.ip_address.clone()),
                MetadataAttribute::new("Certificate Type", CERTIFICATE_TYPE),
            ],
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Value of the attribute named `trait_type`.
    pub fn attribute(&self, trait_type: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.trait_type == trait_type)
            .map(|a| a.value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use examcert_types::{TokenId, WalletAddress};

    fn token() -> CertificateToken {
        CertificateToken {
            token_id: TokenId::FIRST,
            owner: WalletAddress::from_bytes([1; 20]),
            student_id: "SV001".into(),
            subject: "Math".into(),
            exam_session: "Session1".into(),
            score: 88,
            mint_date: Timestamp::new(1_717_230_600),
            ip_address: "1.2.3.4".into(),
            metadata_uri: "uri://1".into(),
        }
    }

    #[test]
    fn document_carries_token_and_evidence() {
        let mut student = StudentRecord::new(
            WalletAddress::from_bytes([1; 20]),
            "SV001",
            "Math",
            "Session1",
            Timestamp::new(1_717_000_000),
        );
        student.is_verified = true;
        student.verification_time = Some(Timestamp::new(1_717_100_000));
        student.image_hash = "hash1".into();

        let doc = CertificateMetadata::build(
            &token(),
            Some(&student),
            Some(Timestamp::new(1_717_150_000)),
            &MetadataLinks::default(),
        );
        assert_eq!(doc.name, "Exam Certificate - SV001");
        assert_eq!(doc.description, "Certificate for Math exam");
        assert_eq!(doc.image, "https://ipfs.io/ipfs/hash1");
        assert_eq!(doc.attribute("Exam Date"), Some("2024-05-31"));
        assert_eq!(doc.attribute("Score"), Some("88"));
        assert_eq!(doc.attribute("Certificate Type"), Some(CERTIFICATE_TYPE));
    }

    #[test]
    fn exam_date_falls_back_to_mint_date() {
        let doc = CertificateMetadata::build(&token(), None, None, &MetadataLinks::default());
        assert_eq!(doc.attribute("Exam Date"), Some("2024-06-01"));
        assert_eq!(doc.attribute("Verification Time"), Some(""));
        let json = doc.to_json_pretty().unwrap();
        assert!(json.contains("\"trait_type\": \"Subject\""));
    }
}
