//! GraphQL documents sent to the commerce backend.

/// Resolves a URL to content (or an error type) plus the active channel.
/// Each error fragment carries the configured page it routes to.
pub const CLASSIFY_CONTENT: &str = r#"
query ClassifyContent($url: String!) {
  channel {
    id
    website { fields { notFoundPage { url } } }
  }
  content(url: $url) {
    __typename
    ... on AuthorizationError {
      channel { website { fields { loginPage { url } } } }
    }
    ... on ForbiddenError {
      channel { website { fields { forbiddenPage { url } } } }
    }
    ... on NotFoundError {
      channel { website { fields { notFoundPage { url } } } }
    }
    ... on Redirect {
      url
      permanent
    }
    ... on Content {
      id
      templateName
    }
  }
}
"#;

pub const CLEAR_CART: &str = r#"
mutation ClearCart {
  clearCart
}
"#;

pub const CREATE_CART: &str = r#"
mutation CreateCart {
  createCart { id }
}
"#;

pub const SEARCH_PRODUCTS: &str = r#"
query SearchProducts($keyword: String, $filter: String, $sort: String, $first: Int!, $skip: Int!) {
  products(keyword: $keyword, filter: $filter, sort: $sort, first: $first, skip: $skip) {
    totalCount
    items
  }
}
"#;
