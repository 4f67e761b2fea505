pub mod audit;
pub mod sitemap;
