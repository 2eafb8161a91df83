//! Ordonnancement: the payment mandate, its validation circuit and signatures.

pub mod machine;
pub mod types;


pub use machine::{
    NewOrdonnancement, ORDONNANCEMENT_MATRIX, OrdonnancementAction, OrdonnancementMachine,
    OrdonnancementTransition, signature_hash,
};
pub use types::{
    BankDetails, ModePaiement, Ordonnancement, OrdonnancementStatus, SignatureRecord, StepStatus,
    ValidationStepRecord,
};
