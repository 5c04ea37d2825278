//! Qualification rules for candidate records

use std::fmt;

use crate::config::FilterPolicy;

use super::types::{CandidateRecord, Email, Phone};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    HasWebsite,
    NoPhone,
    EmailNotValidated,
}

impl Rejection {
    pub fn reason(&self) -> &'static str {
        match self {
            Rejection::HasWebsite => "has-website",
            Rejection::NoPhone => "no-phone",
            Rejection::EmailNotValidated => "email-not-validated",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject(Rejection),
}

impl Decision {
    pub fn is_accept(&self) -> bool {
        matches!(self, Decision::Accept)
    }
}

/// First gate, checked before the listing is opened.
pub fn check_website(has_website: bool) -> Result<(), Rejection> {
    if has_website {
        Err(Rejection::HasWebsite)
    } else {
        Ok(())
    }
}

/// Second gate: a listed phone is the liveness signal.
pub fn check_phone(phone: &Phone) -> Result<(), Rejection> {
    match phone {
        Phone::Listed(_) => Ok(()),
        Phone::Unlisted => Err(Rejection::NoPhone),
    }
}

/// Email is on one of the personal provider domains.
pub fn is_personal_email(email: &Email, policy: &FilterPolicy) -> bool {
    match email {
        Email::Found(address) => policy
            .personal_email_domains
            .iter()
            .any(|domain| address.contains(domain.to_lowercase().as_str())),
        Email::NotFound => false,
    }
}

/// Full decision in gate order: website, phone, then the optional email gate.
pub fn qualify(candidate: &CandidateRecord, policy: &FilterPolicy) -> Decision {
    let gates = check_website(candidate.has_website())
        .and_then(|_| check_phone(&candidate.phone))
        .and_then(|_| {
            if policy.require_validated_email && !candidate.email_validated {
                Err(Rejection::EmailNotValidated)
            } else {
                Ok(())
            }
        });

    match gates {
        Ok(()) => Decision::Accept,
        Err(rejection) => Decision::Reject(rejection),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ghost::types::{QueryUnit, Website};

    fn candidate(website: Website, phone: Phone, email: Email) -> CandidateRecord {
        let email_validated = is_personal_email(&email, &FilterPolicy::default());
        CandidateRecord {
            name: "Acme".into(),
            website,
            phone,
            email,
            email_validated,
            source: QueryUnit::new("Plumbing", "Texas"),
        }
    }

    fn listed() -> Phone {
        Phone::Listed("555-0100".into())
    }

    #[test]
    fn test_website_rejects_regardless_of_other_fields() {
        let policy = FilterPolicy::default();
        for phone in [listed(), Phone::Unlisted] {
            for email in [Email::NotFound, Email::Found("a@gmail.com".into())] {
                let c = candidate(Website::Own, phone.clone(), email);
                assert_eq!(qualify(&c, &policy), Decision::Reject(Rejection::HasWebsite));
            }
        }
    }

    #[test]
    fn test_unlisted_phone_rejected_without_website() {
        let c = candidate(Website::None, Phone::Unlisted, Email::Found("a@gmail.com".into()));
        assert_eq!(
            qualify(&c, &FilterPolicy::default()),
            Decision::Reject(Rejection::NoPhone)
        );
    }

    #[test]
    fn test_email_is_not_a_gate_by_default() {
        let policy = FilterPolicy::default();
        for email in [
            Email::NotFound,
            Email::Found("owner@company.io".into()),
            Email::Found("c@gmail.com".into()),
        ] {
            let c = candidate(Website::None, listed(), email);
            assert!(qualify(&c, &policy).is_accept());
        }
    }

    #[test]
    fn test_social_link_is_not_a_website() {
        let c = candidate(
            Website::Social("https://instagram.com/acme".into()),
            listed(),
            Email::NotFound,
        );
        assert!(qualify(&c, &FilterPolicy::default()).is_accept());
    }

    #[test]
    fn test_strict_email_policy() {
        let policy = FilterPolicy {
            require_validated_email: true,
            ..Default::default()
        };

        let business = candidate(Website::None, listed(), Email::Found("info@acme.com".into()));
        assert_eq!(
            qualify(&business, &policy),
            Decision::Reject(Rejection::EmailNotValidated)
        );

        let personal = candidate(Website::None, listed(), Email::Found("acme@yahoo.com".into()));
        assert!(qualify(&personal, &policy).is_accept());
    }

    #[test]
    fn test_personal_email_detection() {
        let policy = FilterPolicy::default();
        assert!(is_personal_email(&Email::Found("x@outlook.com".into()), &policy));
        assert!(!is_personal_email(&Email::Found("x@acme.com".into()), &policy));
        assert!(!is_personal_email(&Email::NotFound, &policy));
    }

    #[test]
    fn test_reason_strings() {
        assert_eq!(Rejection::HasWebsite.to_string(), "has-website");
        assert_eq!(Rejection::NoPhone.to_string(), "no-phone");
    }
}
