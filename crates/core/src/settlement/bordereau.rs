//! Bordereaux: batch receipts over a selection of payment movements.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sygfp_shared::types::{Montant, ReglementId};

use crate::settlement::error::SettlementError;
use crate::settlement::types::Reglement;

const PREFIX: &str = "BRD";
const MAX_SEQUENCE: u16 = 9999;

/// A bordereau number, `BRD-{exercice:04}-{sequence:04}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BordereauNumber {
    exercice: u16,
    sequence: u16,
}

impl BordereauNumber {
    /// Creates a number; both parts must fit four digits.
    pub fn new(exercice: u16, sequence: u16) -> Result<Self, SettlementError> {
        if exercice > MAX_SEQUENCE || sequence > MAX_SEQUENCE {
            return Err(SettlementError::InvalidBordereauNumber(format!(
                "{PREFIX}-{exercice}-{sequence}"
            )));
        }
        Ok(Self { exercice, sequence })
    }

    /// Number built from a sequence allocated for the year.
    ///
    /// Fails once the year has run past four digits.
    pub fn allocated(exercice: u16, sequence: i64) -> Result<Self, SettlementError> {
        let sequence = u16::try_from(sequence)
            .ok()
            .filter(|s| (1..=MAX_SEQUENCE).contains(s))
            .ok_or_else(|| {
                SettlementError::InvalidBordereauNumber(format!("{PREFIX}-{exercice}-{sequence}"))
            })?;
        Self::new(exercice, sequence)
    }

    /// Budget year.
    #[must_use]
    pub const fn exercice(&self) -> u16 {
        self.exercice
    }

    /// Sequence within the year.
    #[must_use]
    pub const fn sequence(&self) -> u16 {
        self.sequence
    }
}

impl fmt::Display for BordereauNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PREFIX}-{:04}-{:04}", self.exercice, self.sequence)
    }
}

impl FromStr for BordereauNumber {
    type Err = SettlementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SettlementError::InvalidBordereauNumber(s.to_string());
        let mut parts = s.trim().split('-');
        let (Some(PREFIX), Some(exercice), Some(sequence), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };
        let four_digits = |part: &str| {
            (part.len() == 4 && part.bytes().all(|b| b.is_ascii_digit()))
                .then(|| part.parse::<u16>().ok())
                .flatten()
        };
        match (four_digits(exercice), four_digits(sequence)) {
            (Some(exercice), Some(sequence)) => Self::new(exercice, sequence),
            _ => Err(invalid()),
        }
    }
}

/// A batch receipt over active payment movements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bordereau {
    /// Batch number.
    pub numero: BordereauNumber,
    /// Movements included, in selection order.
    pub reglements: Vec<ReglementId>,
    /// Rejected movements left out of the batch.
    pub excluded: Vec<ReglementId>,
    /// Sum of included amounts.
    pub total: Montant,
}

impl Bordereau {
    /// Aggregates a caller-selected set of movements.
    ///
    /// Duplicates are counted once. Rejected movements are reported in
    /// `excluded`. No ledger effect.
    pub fn aggregate(
        numero: BordereauNumber,
        selection: &[Reglement],
    ) -> Result<Self, SettlementError> {
        let mut seen = HashSet::new();
        let mut reglements = Vec::new();
        let mut excluded = Vec::new();
        let mut total = Montant::ZERO;

        for reglement in selection.iter().filter(|r| seen.insert(r.id)) {
            if reglement.is_active() {
                total = total.checked_add(reglement.montant)?;
                reglements.push(reglement.id);
            } else {
                excluded.push(reglement.id);
            }
        }

        if reglements.is_empty() {
            return Err(SettlementError::EmptyBordereau);
        }
        Ok(Self {
            numero,
            reglements,
            excluded,
            total,
        })
    }
}
