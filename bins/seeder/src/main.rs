//! Database seeder for SYGFP development and testing.
//!
//! Seeds a budget line for the 2026 exercice, a validated engagement with
//! its ledger posting, and a draft liquidation carrying its supporting
//! documents, so the chain can be walked from liquidation to payment.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use sygfp_core::DgThreshold;
use sygfp_core::budget::{BudgetLine, LedgerEntry, LedgerEntryKind, LedgerTotals};
use sygfp_core::liquidation::{
    LiquidationAmounts, LiquidationMachine, Penalites, TAUX_TVA_STANDARD, TauxRetenues,
};
use sygfp_core::workflow::{Actor, DocumentType, EntityKind, Role};
use sygfp_db::entities::{budget_lines, engagements, liquidations};
use sygfp_db::{
    AttachmentRepository, BudgetLedgerRepository, CreateLiquidationInput, LiquidationRepository,
};
use sygfp_shared::AppConfig;
use sygfp_shared::types::{BudgetLineId, EngagementId, Montant, UserId, timestamp};
use tracing::info;
use uuid::Uuid;

/// Seed budget line ID (consistent for all seeds)
const BUDGET_LINE_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0101);
/// Seed engagement ID
const ENGAGEMENT_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0201);
/// Seed author ID
const SEED_USER_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0002);

const LIQUIDATION_NUMERO: &str = "LIQ-2026-0001";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sygfp=info,seeder=info".into()),
        )
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    let db = sygfp_db::connect_with(&config.database)
        .await
        .context("Failed to connect to database")?;
    info!("Connected to database");

    seed_budget_line(&db).await?;
    seed_engagement(&db).await?;

    let threshold = DgThreshold::new(Montant::new(config.workflow.seuil_validation_dg));
    seed_liquidation(&db, LiquidationMachine::new(threshold)).await?;

    info!("Seeding complete");
    Ok(())
}

fn seed_author() -> Actor {
    Actor::new(UserId::from_uuid(SEED_USER_ID), [Role::Sdct])
}

/// Seeds the 2026 services budget line.
async fn seed_budget_line(db: &DatabaseConnection) -> anyhow::Result<()> {
    if budget_lines::Entity::find_by_id(BUDGET_LINE_ID)
        .one(db)
        .await?
        .is_some()
    {
        info!("Budget line already exists, skipping");
        return Ok(());
    }

    let line = BudgetLine {
        id: BudgetLineId::from_uuid(BUDGET_LINE_ID),
        code: "62-01".to_string(),
        libelle: "Prestations de services".to_string(),
        exercice: 2026,
        dotation_initiale: Montant::new(250_000_000),
        virements_entrants: Montant::ZERO,
        virements_sortants: Montant::ZERO,
        totals: LedgerTotals::default(),
        version: 1,
    };
    BudgetLedgerRepository::new(db.clone())
        .create_line(&line)
        .await
        .context("Failed to insert budget line")?;
    info!(code = %line.code, dotation = %line.dotation_initiale, "Created budget line");
    Ok(())
}

/// Seeds a validated engagement and posts its consumption.
async fn seed_engagement(db: &DatabaseConnection) -> anyhow::Result<()> {
    if engagements::Entity::find_by_id(ENGAGEMENT_ID)
        .one(db)
        .await?
        .is_some()
    {
        info!("Engagement already exists, skipping");
        return Ok(());
    }

    let montant = Montant::new(60_000_000);
    let now = timestamp::now().fixed_offset();
    engagements::ActiveModel {
        id: Set(ENGAGEMENT_ID),
        numero: Set("ENG-2026-0001".to_string()),
        budget_line_id: Set(BUDGET_LINE_ID),
        objet: Set("Maintenance du parc informatique".to_string()),
        montant: Set(montant.minor_units()),
        statut: Set("valide".to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .context("Failed to insert engagement")?;

    let line = BudgetLedgerRepository::new(db.clone())
        .post(&LedgerEntry::new(
            BudgetLineId::from_uuid(BUDGET_LINE_ID),
            LedgerEntryKind::Engagement,
            montant,
            EntityKind::Engagement,
            ENGAGEMENT_ID,
        ))
        .await
        .context("Failed to post engagement")?;
    info!(total_engage = %line.totals.total_engage, "Created engagement ENG-2026-0001");
    Ok(())
}

/// Seeds a draft liquidation above the DG threshold, with its documents.
async fn seed_liquidation(
    db: &DatabaseConnection,
    machine: LiquidationMachine,
) -> anyhow::Result<()> {
    if liquidations::Entity::find()
        .filter(liquidations::Column::Numero.eq(LIQUIDATION_NUMERO))
        .one(db)
        .await?
        .is_some()
    {
        info!("Liquidation already exists, skipping");
        return Ok(());
    }

    let amounts = LiquidationAmounts::from_rates(
        Montant::new(50_000_000),
        TAUX_TVA_STANDARD,
        &TauxRetenues::default(),
        Penalites::Aucune,
    )
    .context("Failed to compute liquidation amounts")?;

    let author = seed_author();
    let liquidation = LiquidationRepository::new(db.clone(), machine)
        .create(
            CreateLiquidationInput {
                numero: LIQUIDATION_NUMERO.to_string(),
                engagement_id: EngagementId::from_uuid(ENGAGEMENT_ID),
                amounts,
                reference_facture: Some("FAC-2026-0042".to_string()),
            },
            &author,
        )
        .await
        .context("Failed to create liquidation")?;

    let attachments = AttachmentRepository::new(db.clone());
    for (document_type, file_name) in [
        (DocumentType::Facture, "FAC-2026-0042.pdf"),
        (DocumentType::BonLivraison, "BL-2026-0042.pdf"),
    ] {
        attachments
            .add(
                EntityKind::Liquidation,
                liquidation.id.into_inner(),
                document_type,
                file_name,
                author.user_id,
            )
            .await
            .with_context(|| format!("Failed to attach {file_name}"))?;
    }
    info!(
        numero = %liquidation.numero,
        net_a_payer = %liquidation.amounts.net_a_payer,
        "Created draft liquidation with documents"
    );
    Ok(())
}
