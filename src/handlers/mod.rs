pub mod articles;
pub mod imports;
pub mod orders;
pub mod suppliers;
