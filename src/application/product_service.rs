use crate::application::read_cache::ReadCache;
use crate::cache::{keys, CacheStore, CacheTtls};
use crate::domain::catalog::{NewProduct, Product, ProductChanges, ProductPage, ProductView};
use crate::domain::errors::DomainError;
use crate::domain::filters::ProductFilters;
use crate::domain::ports::{CategoryRepository, ProductRepository};

pub struct ProductService<P, C, S> {
    products: P,
    categories: C,
    cache: ReadCache<S>,
    ttls: CacheTtls,
}

impl<P, C, S> ProductService<P, C, S>
where
    P: ProductRepository,
    C: CategoryRepository,
    S: CacheStore,
{
    pub fn new(products: P, categories: C, cache: ReadCache<S>, ttls: CacheTtls) -> Self {
        Self {
            products,
            categories,
            cache,
            ttls,
        }
    }

    pub fn get(&self, id: i64) -> Result<ProductView, DomainError> {
        self.cache
            .get_or_load(&keys::product(id), self.ttls.product, || {
                let product = self
                    .products
                    .find_by_id(id)?
                    .ok_or(DomainError::ProductNotFound)?;
                self.view(product)
            })
    }

    pub fn list(&self, filters: ProductFilters) -> Result<ProductPage, DomainError> {
        let filters = filters.normalized();
        if let (Some(min), Some(max)) = (&filters.min_price, &filters.max_price) {
            if min > max {
                return Err(DomainError::InvalidInput(
                    "min_price must not exceed max_price".to_string(),
                ));
            }
        }

        self.cache.get_or_load_keyed(
            keys::product_list(&filters),
            self.ttls.product_list,
            || {
                let (rows, total) = self.products.list(&filters)?;
                let ids: Vec<i64> = rows.iter().map(|p| p.id).collect();
                let mut categories = self.products.categories_of(&ids)?;
                let items = rows
                    .into_iter()
                    .map(|p| {
                        let cats = categories.remove(&p.id).unwrap_or_default();
                        ProductView::new(p, cats)
                    })
                    .collect();
                Ok(ProductPage {
                    items,
                    total,
                    page: filters.page,
                    limit: filters.limit,
                })
            },
        )
    }

    pub fn create(&self, product: NewProduct) -> Result<ProductView, DomainError> {
        let product = product.validated()?;
        self.ensure_categories(&product.category_ids)?;

        let created = self.products.create(&product)?;
        log::info!("Created product {} ({})", created.id, created.name);
        self.invalidate(created.id, &product.category_ids);
        self.view(created)
    }

    pub fn update(&self, id: i64, changes: ProductChanges) -> Result<ProductView, DomainError> {
        let changes = changes.validated()?;
        let mut recounted = Vec::new();
        if let Some(ids) = &changes.category_ids {
            self.ensure_categories(ids)?;
            recounted = self.category_ids_of(id)?;
            recounted.extend_from_slice(ids);
        }

        let updated = self
            .products
            .update(id, &changes)?
            .ok_or(DomainError::ProductNotFound)?;
        log::info!("Updated product {}", id);
        self.invalidate(id, &recounted);
        self.view(updated)
    }

    /// Reviews of the product are deleted with it, so cached reviews go too.
    pub fn delete(&self, id: i64) -> Result<(), DomainError> {
        let categories = self.category_ids_of(id)?;
        if !self.products.delete(id)? {
            return Err(DomainError::ProductNotFound);
        }
        log::info!("Deleted product {}", id);
        self.invalidate(id, &categories);
        self.cache.invalidate_matching(keys::REVIEW_PATTERN);
        self.cache.invalidate_matching(keys::REVIEW_LIST_PATTERN);
        Ok(())
    }

    fn ensure_categories(&self, ids: &[i64]) -> Result<(), DomainError> {
        if self.categories.all_exist(ids)? {
            Ok(())
        } else {
            Err(DomainError::CategoryNotFound)
        }
    }

    fn view(&self, product: Product) -> Result<ProductView, DomainError> {
        let categories = self
            .products
            .categories_of(&[product.id])?
            .remove(&product.id)
            .unwrap_or_default();
        Ok(ProductView::new(product, categories))
    }

    fn category_ids_of(&self, id: i64) -> Result<Vec<i64>, DomainError> {
        Ok(self
            .products
            .categories_of(&[id])?
            .remove(&id)
            .unwrap_or_default()
            .into_iter()
            .map(|c| c.id)
            .collect())
    }

    /// `categories` are those whose product count changed.
    fn invalidate(&self, id: i64, categories: &[i64]) {
        let mut stale = vec![keys::product(id)];
        if !categories.is_empty() {
            stale.push(keys::all_categories());
            stale.extend(categories.iter().copied().map(keys::category));
        }
        self.cache.invalidate(&stale);
        self.cache.invalidate_matching(keys::PRODUCT_LIST_PATTERN);
    }
}
