//! Catalog service

use std::collections::HashMap;

use validator::Validate;

use super::today;
use crate::{
    error::{AppError, AppResult},
    models::{
        loan::Loan,
        material::{CatalogEntry, CreateMaterial},
        user::RequestContext,
    },
    reference::{next_reference, reference_prefix},
    repository::Repository,
};

#[derive(Clone)]
pub struct MaterialsService {
    repository: Repository,
}

impl MaterialsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Every material with its status for today and its active bookings
    pub async fn catalog(&self) -> AppResult<Vec<CatalogEntry>> {
        let today = today();
        let materials = self.repository.materials.list().await?;
        let loans = self.repository.loans.list_active().await?;

        let mut by_material: HashMap<i32, Vec<&Loan>> = HashMap::new();
        for loan in &loans {
            by_material.entry(loan.material_id).or_default().push(loan);
        }

        Ok(materials
            .into_iter()
            .map(|material| {
                let bookings = by_material.get(&material.id).map(Vec::as_slice).unwrap_or(&[]);
                CatalogEntry::build(material, bookings, today)
            })
            .collect())
    }

    pub async fn catalog_entry(&self, id: i32) -> AppResult<CatalogEntry> {
        let material = self.repository.materials.get_by_id(id).await?;
        let loans = self.repository.loans.list_active_for_material(id).await?;
        let bookings: Vec<&Loan> = loans.iter().collect();
        Ok(CatalogEntry::build(material, &bookings, today()))
    }

    /// Add a material, allocating its reference in the same transaction
    pub async fn create(&self, ctx: &RequestContext, data: &CreateMaterial) -> AppResult<CatalogEntry> {
        ctx.require_admin()?;
        data.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let prefix = reference_prefix(&data.name);

        let mut tx = self.repository.pool.begin().await?;
        self.repository.materials.lock_reference_prefix(&mut tx, &prefix).await?;
        let existing = self.repository.materials.references_with_prefix(&mut tx, &prefix).await?;
        let reference = next_reference(&prefix, existing.iter().map(String::as_str));
        let material = self.repository.materials.create(&mut tx, data, &reference).await?;
        tx.commit().await?;

        tracing::info!(material_id = material.id, reference = %material.reference, "Material created");
        Ok(CatalogEntry::build(material, &[], today()))
    }
}
