use serde::Serialize;

/// `{ "data": ... }`
#[derive(Debug, Serialize)]
pub struct Data<T> {
    pub data: T,
}

/// `{ "count": n, "data": [...] }`
#[derive(Debug, Serialize)]
pub struct List<T> {
    pub count: usize,
    pub data: Vec<T>,
}

impl<T> From<Vec<T>> for List<T> {
    fn from(data: Vec<T>) -> Self {
        Self {
            count: data.len(),
            data,
        }
    }
}
