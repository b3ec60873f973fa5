//! OWL 2 and XSD facet terms that are not part of [`oxrdf::vocab`].

use oxrdf::NamedNodeRef;

/// [The class containing every individual](https://www.w3.org/TR/owl2-syntax/#Class_Expressions)
pub const THING: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#Thing");
/// [The empty class](https://www.w3.org/TR/owl2-syntax/#Class_Expressions)
pub const NOTHING: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#Nothing");

// === XSD CONSTRAINING FACETS ===
pub const MIN_INCLUSIVE: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2001/XMLSchema#minInclusive");
pub const MAX_INCLUSIVE: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2001/XMLSchema#maxInclusive");
pub const MIN_EXCLUSIVE: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2001/XMLSchema#minExclusive");
pub const MAX_EXCLUSIVE: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2001/XMLSchema#maxExclusive");
