use apollo_compiler::ast;
use apollo_compiler::Name;

/// A reference to a schema type, as written in argument, variable and value positions.
///
/// `NonNull` never directly wraps another `NonNull`; [`TypeReference::non_null`] enforces it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeReference {
    /// Named type {0}
    Named(Name),
    /// List type {0}
    List(Box<TypeReference>),
    /// Non null type {0}
    NonNull(Box<TypeReference>),
}

impl std::fmt::Display for TypeReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeReference::Named(name) => write!(f, "{name}"),
            TypeReference::List(ty) => write!(f, "[{ty}]"),
            TypeReference::NonNull(ty) => write!(f, "{ty}!"),
        }
    }
}

impl TypeReference {
    pub fn named(name: Name) -> Self {
        TypeReference::Named(name)
    }

    pub fn list(inner: TypeReference) -> Self {
        TypeReference::List(Box::new(inner))
    }

    pub fn non_null(inner: TypeReference) -> Self {
        match inner {
            TypeReference::NonNull(_) => inner,
            other => TypeReference::NonNull(Box::new(other)),
        }
    }

    /// return the name of the type at the core of the wrappers
    ///
    /// Example if we get the type `[User!]!`, it will return "User"
    pub fn inner_named_type(&self) -> &Name {
        match self {
            TypeReference::Named(name) => name,
            TypeReference::List(inner) | TypeReference::NonNull(inner) => inner.inner_named_type(),
        }
    }

    /// The type with its outermost non-null wrapper removed.
    pub fn nullable(&self) -> &TypeReference {
        match self {
            TypeReference::NonNull(inner) => inner,
            other => other,
        }
    }

    /// The item type if this is a (possibly non-null) list.
    pub fn item_type(&self) -> Option<&TypeReference> {
        match self.nullable() {
            TypeReference::List(inner) => Some(inner),
            _ => None,
        }
    }
}

impl From<&ast::Type> for TypeReference {
    fn from(ty: &ast::Type) -> Self {
        match ty {
            ast::Type::Named(name) => TypeReference::Named(name.clone()),
            ast::Type::NonNullNamed(name) => {
                TypeReference::non_null(TypeReference::Named(name.clone()))
            }
            ast::Type::List(inner) => TypeReference::list((&**inner).into()),
            ast::Type::NonNullList(inner) => {
                TypeReference::non_null(TypeReference::list((&**inner).into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use apollo_compiler::name;

    use super::*;

    #[test]
    fn non_null_does_not_nest() {
        let ty = TypeReference::non_null(TypeReference::non_null(TypeReference::named(name!(
            "Int"
        ))));
        assert_eq!(ty.to_string(), "Int!");
    }

    #[test]
    fn converts_from_ast() {
        let ty = ast::Type::Named(name!("User")).non_null().list().non_null();
        let reference = TypeReference::from(&ty);
        assert_eq!(reference.to_string(), "[User!]!");
        assert_eq!(reference.inner_named_type().as_str(), "User");
        assert!(matches!(reference, TypeReference::NonNull(_)));
        assert_eq!(
            reference.item_type().map(ToString::to_string).as_deref(),
            Some("User!")
        );
    }

    #[test]
    fn nullable_strips_one_level() {
        let ty = TypeReference::non_null(TypeReference::list(TypeReference::named(name!("Int"))));
        assert_eq!(ty.nullable().to_string(), "[Int]");
        assert_eq!(ty.nullable().nullable().to_string(), "[Int]");
    }
}
