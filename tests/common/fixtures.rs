use serde_json::{Value, json};

/// The classic bookstore document.
pub fn store() -> Value {
    json!({
        "store": {
            "book": [
                {
                    "category": "reference",
                    "author": "Nigel Rees",
                    "title": "Sayings of the Century",
                    "price": 8.95
                },
                {
                    "category": "fiction",
                    "author": "Evelyn Waugh",
                    "title": "Sword of Honour",
                    "price": 12.99
                },
                {
                    "category": "fiction",
                    "author": "Herman Melville",
                    "title": "Moby Dick",
                    "isbn": "0-553-21311-3",
                    "price": 8.99
                },
                {
                    "category": "fiction",
                    "author": "J. R. R. Tolkien",
                    "title": "The Lord of the Rings",
                    "isbn": "0-395-19395-8",
                    "price": 22.99
                }
            ],
            "bicycle": {
                "color": "red",
                "price": 19.95
            }
        }
    })
}

/// An array of integers `0..n`.
pub fn numbers(n: i64) -> Value {
    Value::Array((0..n).map(Value::from).collect())
}

/// A document exercising nesting, empty containers, escapes and mixed scalars.
pub fn mixed() -> Value {
    json!({
        "name": "root",
        "empty_array": [],
        "empty_object": {},
        "it's": {"back\\slash": [null, true, false]},
        "nested": [[1, [2, [3]]], {"deep": {"deeper": "x"}}],
        "big": 18446744073709551615u64,
        "neg": -7,
        "float": 0.5
    })
}
