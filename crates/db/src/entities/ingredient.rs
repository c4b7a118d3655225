//! Ingredient catalog entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ingredient catalog entity.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ingredient")]
pub struct Model {
    /// Generated identifier.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Ingredient name.
    pub name: String,

    /// Unit the amount is expressed in ("г", "шт", ...).
    pub measurement_unit: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::recipe_ingredient::Entity")]
    RecipeIngredient,
}

impl Related<super::recipe_ingredient::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecipeIngredient.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
