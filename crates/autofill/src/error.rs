use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutofillError {
    #[error("element {element} refers to form {form}, which is not a form element")]
    InvalidFormRef { element: usize, form: usize },

    #[error("page snapshot has {count} elements, limit is {limit}")]
    TooManyElements { count: usize, limit: usize },
}

pub type AutofillResult<T> = Result<T, AutofillError>;
