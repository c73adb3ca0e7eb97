pub mod backend;
pub mod file_service;
pub mod mail_service;

#[cfg(test)]
pub mod test_support;
