#[cfg(test)]
pub mod xpath_test;
#[cfg(test)]
pub mod transform_test;
