// Stage prompts
//
// Each workflow stage prepends the agent persona to its prompt, so these
// stay persona-neutral.

pub const ROUTE_INPUT_PROMPT: &str = "\
Your task is to analyze user input and determine which route the conversation should take.

Available routes:
- \"campaign\": For queries related to creating, managing, or viewing marketing campaigns
- \"route_2\": Reserved for future functionality
- \"route_3\": Reserved for future functionality

Analyze the user's input and determine the most appropriate route.
";

pub const CAMPAIGN_PROMPT: &str = "\
You are a campaign assistant for a real estate sales system. Identify prospects from the \
database that match campaign criteria while strictly adhering to compliance requirements.

## Task:
1. Inspect the database structure with the available database tools if needed
2. Query prospects that qualify for the campaign described in the user request
3. Return ONLY the prospect data rows in structured format (one row per line: id=..., \
full_name=..., preferred_channel=..., phone=..., etc.)

Do NOT create or persist any campaign record; the campaign is recorded later, after \
messages are sent.

## Campaign Criteria Mapping:
The `primary_segment` column contains these exact values:
- `hnw` - High Net Worth prospects
- `investor` - Property Investors
- `first_time` - First-Time Home Buyers

When parsing campaign requirements:
- \"High-Net-Worth, Riyadh\" -> primary_segment = 'hnw' AND city = 'riyadh'
- \"High-Net-Worth, Jeddah\" -> primary_segment = 'hnw' AND city = 'jeddah'
- \"Property Investors\" -> primary_segment = 'investor'
- \"First-Time Buyers\" -> primary_segment = 'first_time'

## Compliance Filter Rules:
Parse compliance settings from the user query and apply filters dynamically:
- \"require dnc\" or \"respect dnc\" -> exclude rows where dnc is true
- \"dnc not required\" -> no dnc filter
- \"require consent\" -> only consent_status = 'opted_in'
- \"consent not required\" -> consent_status in ('opted_in', 'unknown')
- \"record conversations\" -> informational only, no filter

If compliance settings are missing, default to: exclude dnc = true and \
consent_status = 'opted_out'

## Output:
After querying prospects, provide a summary of the campaign and the prospect rows that \
were found.
";

pub const EXTRACT_CUSTOMERS_PROMPT: &str = "\
Extract customer data from prospect information provided in the conversation history.

## Prospect Data Format:
Prospect rows are formatted as: id=..., full_name=..., preferred_channel=..., phone=..., \
whatsapp_number=..., email=..., language=..., city=..., primary_segment=..., \
budget_max=..., property_type_pref=...

## Extraction Rules:
For each prospect row:
1. Extract `full_name` -> use as `name`
2. Extract `preferred_channel` -> one of: 'call', 'whatsapp', 'email'
3. Extract contact info based on `preferred_channel`:
   - 'call' -> use `phone`
   - 'whatsapp' -> use `whatsapp_number` (fallback to `phone` if whatsapp_number is NULL)
   - 'email' -> use `email`
4. Extract `language` -> 'english' or 'arabic'
5. Extract `city` -> optional (omit if not available)
6. Extract `primary_segment` -> optional, one of 'hnw', 'investor', 'first_time'
7. Extract `budget_max` -> optional numeric value
8. Extract `property_type_pref` -> optional property type preference

## Output:
Return one customer object per prospect that has the required contact information for \
its preferred channel. Skip prospects missing required contact info (e.g. \
preferred_channel='whatsapp' but no whatsapp_number or phone).
";

pub const GENERATE_MESSAGES_PROMPT: &str = "\
Generate two equivalent campaign messages (English and Arabic) for a real estate sales \
campaign.

## Requirements:
- Maximum 5 sentences per message
- Professional, engaging tone matching the agent persona
- Arabic: proper translation (not literal)
- Include a clear call-to-action
- Use campaign details and agent persona from context
- Generate an appropriate agent name based on the agent persona
";

pub const SEND_MESSAGES_PROMPT: &str = "\
Send campaign messages to prospects from the conversation history.
## Tools:
- send_email(template, subject, customer_list, language)
- send_whatsapp(template, customer_list, language)
- send_phone_text(to, message, language)

## Process:
1. Read the prospect data provided in the message
2. Group prospects by preferred_channel (call/whatsapp/email) and language \
(english/arabic)
3. For each email group: call send_email once with the pre-generated template for \
that language, subject \"Exclusive Real Estate Opportunity\", and the group's \
customer_list (one entry per prospect with name and contact)
4. For each whatsapp group: call send_whatsapp once with the pre-generated template \
for that language and the group's customer_list
5. For each 'call' prospect: call send_phone_text with their phone number and the \
pre-generated message for their language, with {name} replaced

Keep the {name} placeholder in templates passed to send_email and send_whatsapp; \
those tools substitute it per recipient. Only send to prospects with required \
contact info. Use pre-generated messages only.
";

pub const EXTRACT_CAMPAIGN_DETAILS_PROMPT: &str = "\
Extract campaign metadata from the user's campaign request.

## Fields:
- name: campaign name from the request
- target_city: 'riyadh', 'jeddah', or 'all'
- target_segment: 'hnw', 'investor', 'first_time', or 'all'
- channels: array containing only 'call', 'sms', 'whatsapp', or 'email'
- respect_dnc, require_consent, record_conversations: parse from compliance settings, \
default to true when unspecified
- active_window_start / active_window_end: HH:MM:SS if an active window is mentioned

Return only the extracted metadata.
";
