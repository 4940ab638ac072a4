//! Per-wallet registration record and misconduct flag.

use serde::{Deserialize, Serialize};

use crate::{StudentState, Timestamp, WalletAddress};

/// Registration and identity-verification record for one student wallet.
///
/// Created on registration, mutated exactly once on verification, never deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub wallet: WalletAddress,
    pub student_id: String,
    pub subject: String,
    pub exam_session: String,
    pub registration_time: Timestamp,
    pub is_verified: bool,
    pub verification_time: Option<Timestamp>,
    /// Opaque evidence reference supplied by the verification collaborator.
    pub ip_address: String,
    /// Opaque evidence reference supplied by the verification collaborator.
    pub image_hash: String,
}

impl StudentRecord {
    /// A fresh, unverified record.
    pub fn new(
        wallet: WalletAddress,
        student_id: impl Into<String>,
        subject: impl Into<String>,
        exam_session: impl Into<String>,
        registration_time: Timestamp,
    ) -> Self {
        Self {
            wallet,
            student_id: student_id.into(),
            subject: subject.into(),
            exam_session: exam_session.into(),
            registration_time,
            is_verified: false,
            verification_time: None,
            ip_address: String::new(),
            image_hash: String::new(),
        }
    }

    pub fn state(&self) -> StudentState {
        if self.is_verified {
            StudentState::Verified
        } else {
            StudentState::Registered
        }
    }
}

/// Administrator-set marker that a student was caught cheating.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MisconductFlag {
    pub wallet: WalletAddress,
    pub reason: String,
    pub flagged_at: Timestamp,
}
