//! # Address Repository
//!
//! Address book lookup for checkout. An address only resolves for the user
//! who owns it, so another user's address id behaves exactly like a
//! missing one.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use nexcart_core::{Address, AddressType};

/// Input for [`AddressRepository::insert`].
#[derive(Debug, Clone)]
pub struct NewAddress {
    pub user_id: String,
    pub address_type: AddressType,
    pub street_address: String,
    pub apartment_address: Option<String>,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zip_code: String,
    pub is_default: bool,
}

impl NewAddress {
    /// A minimal address for `user_id`; the remaining fields get placeholder
    /// values.
    pub fn for_user(user_id: impl Into<String>, address_type: AddressType) -> Self {
        NewAddress {
            user_id: user_id.into(),
            address_type,
            street_address: "1 Main Street".to_string(),
            apartment_address: None,
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            country: "US".to_string(),
            zip_code: "62701".to_string(),
            is_default: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AddressRepository;

impl AddressRepository {
    pub fn new() -> Self {
        AddressRepository
    }

    /// Returns the address if it exists and belongs to `owner`.
    pub async fn resolve_address(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        owner: &str,
    ) -> DbResult<Option<Address>> {
        let address = sqlx::query_as::<_, Address>(
            r#"
            SELECT id, user_id, address_type, street_address, apartment_address,
                   city, state, country, zip_code, is_default, created_at
            FROM addresses
            WHERE id = ?1 AND user_id = ?2
            "#,
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(address)
    }

    pub async fn insert(&self, conn: &mut SqliteConnection, new: &NewAddress) -> DbResult<Address> {
        let address = Address {
            id: Uuid::new_v4().to_string(),
            user_id: new.user_id.clone(),
            address_type: new.address_type,
            street_address: new.street_address.clone(),
            apartment_address: new.apartment_address.clone(),
            city: new.city.clone(),
            state: new.state.clone(),
            country: new.country.clone(),
            zip_code: new.zip_code.clone(),
            is_default: new.is_default,
            created_at: Utc::now(),
        };

        debug!(id = %address.id, user_id = %address.user_id, "Inserting address");

        sqlx::query(
            r#"
            INSERT INTO addresses (
                id, user_id, address_type, street_address, apartment_address,
                city, state, country, zip_code, is_default, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&address.id)
        .bind(&address.user_id)
        .bind(address.address_type)
        .bind(&address.street_address)
        .bind(&address.apartment_address)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.country)
        .bind(&address.zip_code)
        .bind(address.is_default)
        .bind(address.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(address)
    }

    /// Deletes an address. Orders referencing it keep existing with the
    /// reference nulled.
    pub async fn delete(&self, conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
        let rows = sqlx::query("DELETE FROM addresses WHERE id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?
            .rows_affected();

        Ok(rows == 1)
    }
}
