use parcelhub_core::{DomainError, DomainResult, TenantId, UserId};

/// Who is calling, on behalf of which tenant.
///
/// Immutable and required by every operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    tenant_id: TenantId,
    user_id: UserId,
    user_name: Option<String>,
}

impl RequestContext {
    pub fn new(tenant_id: TenantId, user_id: UserId) -> Self {
        Self {
            tenant_id,
            user_id,
            user_name: None,
        }
    }

    pub fn with_user_name(mut self, user_name: impl Into<String>) -> Self {
        let name = user_name.into().trim().to_string();
        self.user_name = (!name.is_empty()).then_some(name);
        self
    }

    /// Build from raw identity values; anything missing or blank is `Unauthorized`.
    pub fn authenticate(
        tenant_id: Option<&str>,
        user_id: Option<&str>,
        user_name: Option<&str>,
    ) -> DomainResult<Self> {
        let tenant_id = tenant_id
            .and_then(|t| TenantId::new(t).ok())
            .ok_or(DomainError::Unauthorized)?;
        let user_id = user_id
            .and_then(|u| UserId::new(u).ok())
            .ok_or(DomainError::Unauthorized)?;
        let ctx = Self::new(tenant_id, user_id);
        Ok(match user_name {
            Some(name) => ctx.with_user_name(name),
            None => ctx,
        })
    }

    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }
}
