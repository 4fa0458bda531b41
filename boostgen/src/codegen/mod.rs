//! Classification of C declarations and synthesis of the wrapper code

pub mod c_type;
pub mod call;
pub mod classify;
pub mod gen_func;
pub mod gen_handle;
pub mod gen_struct;
pub mod lines;
pub mod names;
pub mod param;

#[cfg(test)]
mod tests;
