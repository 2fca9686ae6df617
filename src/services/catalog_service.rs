use chrono::Utc;
use uuid::Uuid;

use crate::{
    dto::products::{
        CreateCategoryRequest, CreateProductRequest, UpdateCategoryRequest, UpdateProductRequest,
    },
    error::{AppError, AppResult},
    models::{Category, Product},
    params::{ProductFilter, ProductQuery, SortOption},
    response::Paged,
    session::{AuthUser, ensure_admin},
};

/// Products and categories, read by the cart and checkout, written by admins.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
    categories: Vec<Category>,
}

impl Catalog {
    pub fn new(products: Vec<Product>, categories: Vec<Category>) -> Self {
        Self {
            products,
            categories,
        }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn product(&self, id: Uuid) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn get_product(&self, id: Uuid) -> AppResult<&Product> {
        self.product(id).ok_or_else(|| AppError::not_found("Product"))
    }

    pub fn featured_products(&self) -> Vec<&Product> {
        self.products.iter().filter(|p| p.featured).collect()
    }

    /// Filtered and sorted view of the catalog.
    pub fn visible_products(&self, filter: &ProductFilter, sort: SortOption) -> Vec<Product> {
        let search = filter
            .search
            .as_ref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        let mut items: Vec<Product> = self
            .products
            .iter()
            .filter(|p| {
                filter
                    .category
                    .as_ref()
                    .is_none_or(|category| &p.category == category)
            })
            .filter(|p| {
                filter
                    .subcategory
                    .as_ref()
                    .is_none_or(|sub| p.subcategory.as_ref() == Some(sub))
            })
            .filter(|p| filter.min_price.is_none_or(|min| p.effective_price() >= min))
            .filter(|p| filter.max_price.is_none_or(|max| p.effective_price() <= max))
            .filter(|p| {
                search.as_ref().is_none_or(|term| {
                    p.name.to_lowercase().contains(term)
                        || p.description.to_lowercase().contains(term)
                })
            })
            .cloned()
            .collect();

        match sort {
            SortOption::Name => {
                items.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
            }
            SortOption::PriceLow => items.sort_by_key(Product::effective_price),
            SortOption::PriceHigh => {
                items.sort_by_key(|p| std::cmp::Reverse(p.effective_price()))
            }
            SortOption::Newest => items.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }
        items
    }

    pub fn list_products(&self, query: &ProductQuery) -> Paged<Product> {
        let items = self.visible_products(&query.filter, query.sort.unwrap_or_default());
        Paged::from_vec(items, &query.pagination)
    }

    pub fn create_product(
        &mut self,
        user: &AuthUser,
        payload: CreateProductRequest,
    ) -> AppResult<Product> {
        ensure_admin(user)?;
        let product = Product {
            id: Uuid::new_v4(),
            name: payload.name,
            images: payload.images,
            regular_price: payload.regular_price,
            discounted_price: payload.discounted_price,
            category: payload.category,
            subcategory: payload.subcategory.filter(|s| !s.is_empty()),
            description: payload.description,
            stock: payload.stock,
            featured: payload.featured,
            created_at: Utc::now(),
        };
        product.validate()?;
        self.products.push(product.clone());

        tracing::info!(admin_id = %user.user_id, product_id = %product.id, "product created");
        Ok(product)
    }

    pub fn update_product(
        &mut self,
        user: &AuthUser,
        id: Uuid,
        payload: UpdateProductRequest,
    ) -> AppResult<Product> {
        ensure_admin(user)?;
        let existing = self
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::not_found("Product"))?;

        let mut updated = existing.clone();
        if let Some(name) = payload.name {
            updated.name = name;
        }
        if let Some(images) = payload.images {
            updated.images = images;
        }
        if let Some(price) = payload.regular_price {
            updated.regular_price = price;
        }
        if let Some(discounted) = payload.discounted_price {
            updated.discounted_price = Some(discounted);
        } else if payload.remove_discount {
            updated.discounted_price = None;
        }
        if let Some(category) = payload.category {
            updated.category = category;
        }
        if let Some(subcategory) = payload.subcategory {
            updated.subcategory = Some(subcategory).filter(|s| !s.is_empty());
        }
        if let Some(description) = payload.description {
            updated.description = description;
        }
        if let Some(stock) = payload.stock {
            updated.stock = stock;
        }
        if let Some(featured) = payload.featured {
            updated.featured = featured;
        }

        // validate before touching the stored record so a bad update changes nothing
        updated.validate()?;
        *existing = updated.clone();

        tracing::info!(admin_id = %user.user_id, product_id = %id, "product updated");
        Ok(updated)
    }

    pub fn delete_product(&mut self, user: &AuthUser, id: Uuid) -> AppResult<()> {
        ensure_admin(user)?;
        let before = self.products.len();
        self.products.retain(|p| p.id != id);
        if self.products.len() == before {
            return Err(AppError::not_found("Product"));
        }

        tracing::info!(admin_id = %user.user_id, product_id = %id, "product deleted");
        Ok(())
    }

    pub fn category(&self, id: Uuid) -> Option<&Category> {
        self.categories.iter().find_map(|c| {
            if c.id == id {
                Some(c)
            } else {
                c.subcategories.iter().find(|sub| sub.id == id)
            }
        })
    }

    pub fn create_category(
        &mut self,
        user: &AuthUser,
        payload: CreateCategoryRequest,
    ) -> AppResult<Category> {
        ensure_admin(user)?;
        let name = payload.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::validation("Category name is required"));
        }
        let slug = payload
            .slug
            .map(|s| slugify(&s))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| slugify(&name));

        let category = Category {
            id: Uuid::new_v4(),
            name,
            slug,
            parent_id: payload.parent_id,
            subcategories: Vec::new(),
        };

        match payload.parent_id {
            Some(parent_id) => {
                let parent = self
                    .categories
                    .iter_mut()
                    .find(|c| c.id == parent_id)
                    .ok_or_else(|| AppError::not_found("Parent category"))?;
                parent.subcategories.push(category.clone());
            }
            None => self.categories.push(category.clone()),
        }

        tracing::info!(admin_id = %user.user_id, category_id = %category.id, "category created");
        Ok(category)
    }

    pub fn update_category(
        &mut self,
        user: &AuthUser,
        id: Uuid,
        payload: UpdateCategoryRequest,
    ) -> AppResult<Category> {
        ensure_admin(user)?;
        let category = find_category_mut(&mut self.categories, id)
            .ok_or_else(|| AppError::not_found("Category"))?;

        if let Some(name) = payload.name.map(|n| n.trim().to_string()) {
            if name.is_empty() {
                return Err(AppError::validation("Category name is required"));
            }
            category.name = name;
        }
        if let Some(slug) = payload.slug {
            category.slug = slugify(&slug);
        }
        if category.slug.is_empty() {
            category.slug = slugify(&category.name);
        }

        tracing::info!(admin_id = %user.user_id, category_id = %id, "category updated");
        Ok(category.clone())
    }

    pub fn delete_category(&mut self, user: &AuthUser, id: Uuid) -> AppResult<()> {
        ensure_admin(user)?;
        let before = count_categories(&self.categories);
        self.categories.retain(|c| c.id != id);
        for parent in &mut self.categories {
            parent.subcategories.retain(|sub| sub.id != id);
        }
        if count_categories(&self.categories) == before {
            return Err(AppError::not_found("Category"));
        }

        tracing::info!(admin_id = %user.user_id, category_id = %id, "category deleted");
        Ok(())
    }
}

fn find_category_mut(categories: &mut [Category], id: Uuid) -> Option<&mut Category> {
    for category in categories.iter_mut() {
        if category.id == id {
            return Some(category);
        }
        if let Some(sub) = category.subcategories.iter_mut().find(|sub| sub.id == id) {
            return Some(sub);
        }
    }
    None
}

fn count_categories(categories: &[Category]) -> usize {
    categories
        .iter()
        .map(|c| 1 + c.subcategories.len())
        .sum()
}

/// URL-safe slug: lowercase ASCII alphanumerics separated by single dashes.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}
