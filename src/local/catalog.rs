use crate::domain::ProductRequest;

/// Products brought in by a sync. Names already present are skipped.
pub(super) fn seed_catalog() -> Vec<ProductRequest> {
    [
        ("Backpack 15in", "bags", "Fjall Supply", 109.95, 120),
        ("Slim Fit T-Shirt", "men's clothing", "Cotton Works", 22.30, 259),
        ("Cotton Jacket", "men's clothing", "Cotton Works", 55.99, 500),
        ("Silver Dragon Bracelet", "jewelery", "John Hardy", 695.00, 400),
        ("Solid Gold Petite Ring", "jewelery", "John Hardy", 168.00, 70),
        ("Portable External Drive 2TB", "electronics", "WD", 64.00, 203),
        ("Internal SSD 1TB", "electronics", "SanDisk", 109.00, 470),
        ("27in Gaming Monitor", "electronics", "Acer", 599.00, 250),
        ("Snowboard Jacket", "women's clothing", "BIYLACLESEN", 56.99, 235),
        ("Rain Jacket", "women's clothing", "Lock and Love", 39.99, 679),
    ]
    .into_iter()
    .map(|(name, category, supplier, price, stock)| ProductRequest {
        name: name.to_string(),
        category: category.to_string(),
        supplier: supplier.to_string(),
        price,
        stock,
    })
    .collect()
}
