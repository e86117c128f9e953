pub type SessionId = String;
pub type TurnId = u64;
pub type Seq = u64;
pub type WorkerId = String;
pub type ClaimId = String;
