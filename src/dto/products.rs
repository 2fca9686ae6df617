use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub images: Vec<String>,
    pub regular_price: i64,
    pub discounted_price: Option<i64>,
    pub category: String,
    pub subcategory: Option<String>,
    pub description: String,
    pub stock: i32,
    #[serde(default)]
    pub featured: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub images: Option<Vec<String>>,
    pub regular_price: Option<i64>,
    pub discounted_price: Option<i64>,
    /// Drop the current discount; ignored when `discounted_price` is set.
    #[serde(default)]
    pub remove_discount: bool,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub description: Option<String>,
    pub stock: Option<i32>,
    pub featured: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub slug: Option<String>,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
}
