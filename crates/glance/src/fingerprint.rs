use glance_types::{Downsampler, ResourceId, TypeKey};

/// Everything about a request that changes what ends up on the target.
///
/// Two requests with equal fingerprints against the same target are the same
/// request, and the target's presenter is reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    model: TypeKey,
    loader: TypeKey,
    downsampler: &'static str,
    transformation: String,
    animation: Option<ResourceId>,
    placeholder: Option<ResourceId>,
    error: Option<ResourceId>,
}

impl Fingerprint {
    pub fn new(
        model: TypeKey,
        loader: TypeKey,
        downsampler: Downsampler,
        transformation: impl Into<String>,
        animation: Option<ResourceId>,
        placeholder: Option<ResourceId>,
        error: Option<ResourceId>,
    ) -> Self {
        Self {
            model,
            loader,
            downsampler: downsampler.id(),
            transformation: transformation.into(),
            animation,
            placeholder,
            error,
        }
    }

    pub fn model(&self) -> TypeKey {
        self.model
    }

    pub fn loader(&self) -> TypeKey {
        self.loader
    }

    pub fn downsampler(&self) -> &'static str {
        self.downsampler
    }

    pub fn transformation(&self) -> &str {
        &self.transformation
    }

    pub fn animation(&self) -> Option<ResourceId> {
        self.animation
    }

    pub fn placeholder(&self) -> Option<ResourceId> {
        self.placeholder
    }

    pub fn error(&self) -> Option<ResourceId> {
        self.error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    use std::path::PathBuf;

    struct PathLoader;
    struct OtherLoader;

    fn base() -> Fingerprint {
        Fingerprint::new(
            TypeKey::of::<PathBuf>(),
            TypeKey::of::<PathLoader>(),
            Downsampler::AtLeast,
            "CENTER_CROP",
            None,
            Some(ResourceId(42)),
            None,
        )
    }

    fn hash_of(fingerprint: &Fingerprint) -> u64 {
        let mut hasher = DefaultHasher::new();
        fingerprint.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_equal_fingerprints_hash_equally() {
        let a = base();
        let b = base();
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_every_field_participates() {
        let variants = [
            Fingerprint {
                model: TypeKey::of::<String>(),
                ..base()
            },
            Fingerprint {
                loader: TypeKey::of::<OtherLoader>(),
                ..base()
            },
            Fingerprint {
                downsampler: Downsampler::FullSize.id(),
                ..base()
            },
            Fingerprint {
                transformation: "FIT_CENTER".to_string(),
                ..base()
            },
            Fingerprint {
                animation: Some(ResourceId(7)),
                ..base()
            },
            Fingerprint {
                placeholder: None,
                ..base()
            },
            Fingerprint {
                error: Some(ResourceId(9)),
                ..base()
            },
        ];

        for variant in &variants {
            assert_ne!(*variant, base());
        }

        let mut set: HashSet<Fingerprint> = variants.into_iter().collect();
        assert_eq!(set.len(), 7);
        assert!(set.insert(base()));
        assert!(!set.insert(base()));
    }

    #[test]
    fn test_accessors() {
        let fingerprint = base();
        assert_eq!(fingerprint.model(), TypeKey::of::<PathBuf>());
        assert_eq!(fingerprint.loader(), TypeKey::of::<PathLoader>());
        assert_eq!(fingerprint.downsampler(), "AT_LEAST");
        assert_eq!(fingerprint.transformation(), "CENTER_CROP");
        assert_eq!(fingerprint.placeholder(), Some(ResourceId(42)));
        assert_eq!(fingerprint.animation(), None);
        assert_eq!(fingerprint.error(), None);
    }
}
