//! Typed read queries for the content store.
//!
//! A `Query` is validated while it is being built and renders to the nested
//! query-string keys the store understands, e.g.
//! `filters[category][slug][$eq]=varejo`.

const DEFAULT_PAGE_SIZE: u32 = 25;
const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("`{0}` is not a valid field path")]
    InvalidField(String),
    #[error("page and page size must be greater than zero")]
    InvalidPagination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Eq,
    Ne,
    Contains,
    Gte,
    Lte,
}

impl AsRef<str> for FilterOperator {
    fn as_ref(&self) -> &str {
        match self {
            FilterOperator::Eq => "$eq",
            FilterOperator::Ne => "$ne",
            FilterOperator::Contains => "$contains",
            FilterOperator::Gte => "$gte",
            FilterOperator::Lte => "$lte",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Bool(bool),
    Integer(i64),
}

impl FilterValue {
    fn render(&self) -> String {
        match self {
            FilterValue::Text(text) => text.clone(),
            FilterValue::Bool(flag) => flag.to_string(),
            FilterValue::Integer(number) => number.to_string(),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Bool(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Integer(value)
    }
}

impl From<u64> for FilterValue {
    fn from(value: u64) -> Self {
        FilterValue::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

/// A dotted path to a (possibly nested) field, e.g. `category.slug`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub fn parse(path: &str) -> Result<FieldPath, QueryError> {
        let segments: Vec<String> = path.split('.').map(String::from).collect();
        let is_valid = segments.iter().all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|char| char.is_ascii_alphanumeric() || char == '_')
        });

        if !is_valid {
            return Err(QueryError::InvalidField(path.to_string()));
        }

        Ok(Self(segments))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    fn dotted(&self) -> String {
        self.0.join(".")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: FieldPath,
    pub operator: FilterOperator,
    pub value: FilterValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: FieldPath,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    filters: Vec<Filter>,
    sort: Vec<Sort>,
    pagination: Option<Pagination>,
    populate: Vec<FieldPath>,
    fields: Vec<FieldPath>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(
        mut self,
        field: &str,
        operator: FilterOperator,
        value: impl Into<FilterValue>,
    ) -> Result<Self, QueryError> {
        self.filters.push(Filter {
            field: FieldPath::parse(field)?,
            operator,
            value: value.into(),
        });
        Ok(self)
    }

    pub fn sort(mut self, field: &str, direction: SortDirection) -> Result<Self, QueryError> {
        self.sort.push(Sort {
            field: FieldPath::parse(field)?,
            direction,
        });
        Ok(self)
    }

    /// Page sizes above the store's maximum are clamped.
    pub fn paginate(mut self, page: u32, page_size: u32) -> Result<Self, QueryError> {
        if page == 0 || page_size == 0 {
            return Err(QueryError::InvalidPagination);
        }
        self.pagination = Some(Pagination {
            page,
            page_size: page_size.min(MAX_PAGE_SIZE),
        });
        Ok(self)
    }

    pub fn populate(mut self, relations: &[&str]) -> Result<Self, QueryError> {
        for relation in relations {
            self.populate.push(FieldPath::parse(relation)?);
        }
        Ok(self)
    }

    pub fn fields(mut self, fields: &[&str]) -> Result<Self, QueryError> {
        for field in fields {
            self.fields.push(FieldPath::parse(field)?);
        }
        Ok(self)
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn sorting(&self) -> &[Sort] {
        &self.sort
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination.unwrap_or_default()
    }

    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();

        for filter in &self.filters {
            let nested: String = filter
                .field
                .segments()
                .iter()
                .map(|segment| format!("[{}]", segment))
                .collect();
            pairs.push((
                format!("filters{}[{}]", nested, filter.operator.as_ref()),
                filter.value.render(),
            ));
        }

        for (index, sort) in self.sort.iter().enumerate() {
            let direction = match sort.direction {
                SortDirection::Asc => "asc",
                SortDirection::Desc => "desc",
            };
            pairs.push((
                format!("sort[{}]", index),
                format!("{}:{}", sort.field.dotted(), direction),
            ));
        }

        if let Some(pagination) = self.pagination {
            pairs.push((String::from("pagination[page]"), pagination.page.to_string()));
            pairs.push((
                String::from("pagination[pageSize]"),
                pagination.page_size.to_string(),
            ));
        }

        for (index, relation) in self.populate.iter().enumerate() {
            pairs.push((format!("populate[{}]", index), relation.dotted()));
        }

        for (index, field) in self.fields.iter().enumerate() {
            pairs.push((format!("fields[{}]", index), field.dotted()));
        }

        pairs
    }
}
