use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageError {
    #[error("that page number is not an integer")]
    NotAnInteger,
    #[error("that page number is less than 1")]
    LessThanOne,
    #[error("that page contains no results")]
    Empty,
}

/// Splits a list into fixed-size pages. An empty list still has one page.
#[derive(Debug, Clone)]
pub struct Paginator<T> {
    items: Vec<T>,
    per_page: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub number: usize,
    pub num_pages: usize,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn next_page_number(&self) -> Option<usize> {
        self.has_next().then_some(self.number + 1)
    }

    pub fn previous_page_number(&self) -> Option<usize> {
        self.has_previous().then_some(self.number - 1)
    }
}

impl<T: Clone> Paginator<T> {
    pub fn new(items: Vec<T>, per_page: usize) -> Self {
        Self {
            items,
            per_page: per_page.max(1),
        }
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn num_pages(&self) -> usize {
        self.items.len().div_ceil(self.per_page).max(1)
    }

    pub fn validate_number(&self, raw: &str) -> Result<usize, PageError> {
        let n: i64 = raw.trim().parse().map_err(|_| PageError::NotAnInteger)?;
        if n < 1 {
            return Err(PageError::LessThanOne);
        }
        let n = n as usize;
        if n > self.num_pages() {
            return Err(PageError::Empty);
        }
        Ok(n)
    }

    pub fn page(&self, raw: &str) -> Result<Page<T>, PageError> {
        let number = self.validate_number(raw)?;
        Ok(self.page_unchecked(number))
    }

    /// Page for a query parameter the way the list view treats it: missing or
    /// non-integer gives page 1, anything out of range gives the last page.
    pub fn page_or_fallback(&self, raw: Option<&str>) -> Page<T> {
        match self.page(raw.unwrap_or("1")) {
            Ok(page) => page,
            Err(PageError::NotAnInteger) => self.page_unchecked(1),
            Err(PageError::LessThanOne | PageError::Empty) => self.page_unchecked(self.num_pages()),
        }
    }

    fn page_unchecked(&self, number: usize) -> Page<T> {
        let start = (number - 1) * self.per_page;
        let end = (start + self.per_page).min(self.items.len());
        Page {
            number,
            num_pages: self.num_pages(),
            items: self.items.get(start..end).map(<[T]>::to_vec).unwrap_or_default(),
        }
    }
}
