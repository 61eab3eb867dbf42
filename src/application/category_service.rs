use crate::application::read_cache::ReadCache;
use crate::cache::{keys, CacheStore, CacheTtls};
use crate::domain::catalog::{
    Category, CategoryChanges, CategoryList, CategoryView, NewCategory,
};
use crate::domain::errors::DomainError;
use crate::domain::ports::CategoryRepository;

pub struct CategoryService<R, S> {
    repo: R,
    cache: ReadCache<S>,
    ttls: CacheTtls,
}

impl<R: CategoryRepository, S: CacheStore> CategoryService<R, S> {
    pub fn new(repo: R, cache: ReadCache<S>, ttls: CacheTtls) -> Self {
        Self { repo, cache, ttls }
    }

    pub fn get(&self, id: i64) -> Result<CategoryView, DomainError> {
        self.cache
            .get_or_load(&keys::category(id), self.ttls.category, || {
                self.repo.find_by_id(id)?.ok_or(DomainError::CategoryNotFound)
            })
    }

    pub fn list_all(&self) -> Result<CategoryList, DomainError> {
        self.cache
            .get_or_load(&keys::all_categories(), self.ttls.category, || {
                let items = self.repo.list_all()?;
                Ok(CategoryList {
                    total: items.len() as i64,
                    items,
                })
            })
    }

    pub fn create(&self, category: NewCategory) -> Result<CategoryView, DomainError> {
        let category = category.validated()?;
        let created = self.repo.create(&category)?;
        log::info!("Created category {} ({})", created.id, created.name);
        self.invalidate(created.id);
        Ok(fresh_view(created))
    }

    pub fn update(&self, id: i64, changes: CategoryChanges) -> Result<CategoryView, DomainError> {
        let changes = changes.validated()?;
        self.repo
            .update(id, &changes)?
            .ok_or(DomainError::CategoryNotFound)?;
        log::info!("Updated category {}", id);
        self.invalidate(id);
        self.repo.find_by_id(id)?.ok_or(DomainError::CategoryNotFound)
    }

    pub fn delete(&self, id: i64) -> Result<(), DomainError> {
        if !self.repo.delete(id)? {
            return Err(DomainError::CategoryNotFound);
        }
        log::info!("Deleted category {}", id);
        self.invalidate(id);
        Ok(())
    }

    /// Product views embed category names, so every product entry goes too.
    fn invalidate(&self, id: i64) {
        self.cache
            .invalidate(&[keys::category(id), keys::all_categories()]);
        self.cache.invalidate_matching(keys::PRODUCT_PATTERN);
        self.cache.invalidate_matching(keys::PRODUCT_LIST_PATTERN);
    }
}

fn fresh_view(category: Category) -> CategoryView {
    CategoryView {
        id: category.id,
        uuid: category.uuid,
        name: category.name,
        description: category.description,
        product_count: 0,
    }
}
